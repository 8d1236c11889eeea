pub mod reasons;
pub mod severity;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::forensics::{ForensicEntry, ForensicLogger};
use crate::models::{AlertRecord, JobRecord, JobType};
use crate::queue::alert_queue::AlertQueue;
use crate::queue::job_queue::JobQueue;
use crate::state::PreallocatedState;

use reasons::{apply_heuristics, build_reason};
use severity::{evaluate_severity, score_to_severity};

pub struct DecisionEngine {
    state: Arc<PreallocatedState>,
    alerts: Arc<AlertQueue>,
    jobs: Arc<JobQueue>,
    forensics: Option<Arc<ForensicLogger>>,
    metrics: Arc<crate::metrics::Metrics>,
}

impl DecisionEngine {
    pub fn new(
        state: Arc<PreallocatedState>,
        alerts: Arc<AlertQueue>,
        jobs: Arc<JobQueue>,
        forensics: Option<Arc<ForensicLogger>>,
        metrics: Arc<crate::metrics::Metrics>,
    ) -> Self {
        DecisionEngine { state, alerts, jobs, forensics, metrics }
    }

    pub fn run(&self, running: &std::sync::atomic::AtomicBool, watchdog: &crate::watchdog::Watchdog) {
        while running.load(Ordering::Relaxed) {
            watchdog.heartbeat("decision");
            match self.alerts.pop() {
                Some(alert) => self.process_alert(&alert),
                None => std::thread::yield_now(),
            }
        }
    }

    pub fn process_alert(&self, alert: &AlertRecord) {
        let guild_slot = self.state.guild_index.get(alert.guild_id);
        if guild_slot == 0 {
            return;
        }

        let flag_count = alert.flags.count_ones();
        let score = evaluate_severity(alert.flags, flag_count);
        let sev = score_to_severity(score);

        let heuristics = apply_heuristics(sev, alert.flags);
        let event_type = alert.event_kind();
        let panic_mode = alert.panic_mode != 0;
        let reason = build_reason(event_type, alert.flags, panic_mode);

        if let Some(logger) = &self.forensics {
            let entry = ForensicEntry {
                timestamp_ns: alert.timestamp_ns,
                event_type: format!("{event_type:?}"),
                guild_id: alert.guild_id,
                actor_id: alert.actor_id,
                target_id: alert.target_id,
                severity: score,
                data: serde_json::json!({
                    "flags": alert.flags,
                    "confidence": heuristics.confidence,
                    "panic_mode": panic_mode,
                }),
            };
            if let Err(err) = logger.append(&entry) {
                log::warn!(target: "antinuke_audit", "forensic log append failed: {err:#}");
            }
        }

        // Panic mode emits one Ban job per alert unconditionally —
        // duplicates are allowed by design (spec §8) since minimum
        // latency matters more than suppressing a repeat there. Normal
        // mode dedups via the `banned` sticky bit: once an actor is
        // banned, a replayed alert for them produces no second job.
        if panic_mode {
            self.jobs.push(JobRecord {
                job_type: JobType::Ban,
                event_type,
                panic_mode,
                guild_id: alert.guild_id,
                target_id: alert.actor_id,
                reason,
                detection_time_ns: alert.timestamp_ns,
            });
            self.metrics.inc_jobs_dispatched();
            return;
        }

        if heuristics.should_ban {
            if let Some(actor_slot) = Some(self.state.actor_index.get(alert.actor_id)).filter(|s| *s != 0) {
                if let Some(counters) = self.state.actor_counters(actor_slot) {
                    if !counters.try_set_banned() {
                        // Already banned by a previous alert for this actor.
                        return;
                    }
                }
            }
            self.jobs.push(JobRecord {
                job_type: JobType::Ban,
                event_type,
                panic_mode,
                guild_id: alert.guild_id,
                target_id: alert.actor_id,
                reason: reason.clone(),
                detection_time_ns: alert.timestamp_ns,
            });
            self.metrics.inc_jobs_dispatched();
        }

        if heuristics.should_lockdown {
            self.jobs.push(JobRecord {
                job_type: JobType::Lockdown,
                event_type,
                panic_mode,
                guild_id: alert.guild_id,
                target_id: alert.guild_id,
                reason,
                detection_time_ns: alert.timestamp_ns,
            });
            if let Some(g) = self.state.guild_counters(guild_slot) {
                g.set_lockdown(true);
            }
        } else if heuristics.should_quarantine {
            self.jobs.push(JobRecord {
                job_type: JobType::Quarantine,
                event_type,
                panic_mode,
                guild_id: alert.guild_id,
                target_id: alert.actor_id,
                reason,
                detection_time_ns: alert.timestamp_ns,
            });
        }
    }
}

impl AlertRecord {
    pub fn event_kind(&self) -> crate::models::EventType {
        crate::models::EventType::from_u8(self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flags;

    fn make_engine() -> (DecisionEngine, Arc<JobQueue>) {
        let jobs = Arc::new(JobQueue::new(64));
        let engine = DecisionEngine::new(
            Arc::new(PreallocatedState::new()),
            Arc::new(AlertQueue::new(64)),
            jobs.clone(),
            None,
            Arc::new(crate::metrics::Metrics::new()),
        );
        (engine, jobs)
    }

    #[test]
    fn high_severity_alert_produces_ban_job() {
        let (engine, jobs) = make_engine();
        engine.state.register_guild(1, 50);
        engine.state.register_actor(2);
        let alert = AlertRecord {
            guild_id: 1,
            actor_id: 2,
            target_id: 3,
            event_type: crate::models::EventType::ChannelDelete as u8,
            severity: 2,
            panic_mode: 0,
            flags: flags::FLAG_BAN | flags::FLAG_CHANNEL,
            timestamp_ns: 0,
        };
        engine.process_alert(&alert);
        let job = jobs.pop().unwrap();
        assert_eq!(job.job_type, JobType::Ban);
        assert_eq!(job.target_id, 2);
    }

    #[test]
    fn banning_the_same_actor_twice_only_dispatches_once() {
        let (engine, jobs) = make_engine();
        engine.state.register_guild(1, 50);
        engine.state.register_actor(2);
        let alert = AlertRecord {
            guild_id: 1,
            actor_id: 2,
            target_id: 3,
            event_type: crate::models::EventType::ChannelDelete as u8,
            severity: 2,
            panic_mode: 0,
            flags: flags::FLAG_BAN | flags::FLAG_CHANNEL,
            timestamp_ns: 0,
        };
        engine.process_alert(&alert);
        engine.process_alert(&alert);
        assert!(jobs.pop().is_some());
        assert!(jobs.pop().is_none());
    }

    #[test]
    fn unknown_guild_is_ignored() {
        let (engine, jobs) = make_engine();
        let alert = AlertRecord { guild_id: 999, ..Default::default() };
        engine.process_alert(&alert);
        assert!(jobs.pop().is_none());
    }
}
