pub mod http_pool;
pub mod rate_limit;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::models::{JobRecord, JobType};
use crate::notify::discord::DiscordNotifier;
use crate::platform::PlatformClient;
use crate::queue::job_queue::JobQueue;

pub struct Dispatcher {
    jobs: Arc<JobQueue>,
    platform: Arc<dyn PlatformClient>,
    notifier: Option<Arc<DiscordNotifier>>,
    metrics: Arc<crate::metrics::Metrics>,
}

impl Dispatcher {
    pub fn new(
        jobs: Arc<JobQueue>,
        platform: Arc<dyn PlatformClient>,
        notifier: Option<Arc<DiscordNotifier>>,
        metrics: Arc<crate::metrics::Metrics>,
    ) -> Self {
        Dispatcher { jobs, platform, notifier, metrics }
    }

    /// Spawns `worker_count` OS threads, each draining `self.jobs`.
    /// Returns the join handles so the caller can shut them down.
    pub fn spawn_workers(
        self: Arc<Self>,
        worker_count: usize,
        running: Arc<std::sync::atomic::AtomicBool>,
        watchdog: Arc<crate::watchdog::Watchdog>,
    ) -> Vec<std::thread::JoinHandle<()>> {
        (0..worker_count.max(1))
            .map(|worker_id| {
                let dispatcher = self.clone();
                let running = running.clone();
                let watchdog = watchdog.clone();
                std::thread::spawn(move || dispatcher.worker_loop(worker_id, &running, &watchdog))
            })
            .collect()
    }

    fn worker_loop(
        &self,
        worker_id: usize,
        running: &std::sync::atomic::AtomicBool,
        watchdog: &crate::watchdog::Watchdog,
    ) {
        while running.load(Ordering::Relaxed) {
            watchdog.heartbeat("dispatcher");
            match self.jobs.pop() {
                Some(job) => self.execute(worker_id, job),
                None => std::thread::yield_now(),
            }
        }
    }

    fn execute(&self, worker_id: usize, job: JobRecord) {
        let detection_ns = job.detection_time_ns;
        let outcome = match job.job_type {
            JobType::Ban => self.platform.ban_member(job.guild_id, job.target_id, &job.reason),
            JobType::Kick => self.platform.kick_member(job.guild_id, job.target_id, &job.reason),
            JobType::Quarantine => self.platform.kick_member(job.guild_id, job.target_id, &job.reason),
            JobType::Lockdown => self.platform.lockdown_guild(job.guild_id, &job.reason),
            JobType::RoleRemove => self.platform.remove_role(job.guild_id, job.target_id, 0, &job.reason),
        };

        match &outcome {
            Ok(()) => {
                self.metrics.inc_jobs_dispatched();
                match job.job_type {
                    JobType::Ban => self.metrics.inc_bans_issued(),
                    JobType::Kick | JobType::Quarantine => self.metrics.inc_kicks_issued(),
                    _ => {}
                }
            }
            Err(err) => {
                self.metrics.inc_http_error();
                log::error!(
                    target: "antinuke_audit",
                    "worker {worker_id} failed to execute {:?} for guild {}: {err:#}",
                    job.job_type,
                    job.guild_id
                );
            }
        }

        if outcome.is_ok() {
            if let Some(notifier) = &self.notifier {
                let ban_ns = crate::clock::elapsed_since(detection_ns);
                notifier.notify_action(&job, ban_ns);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockPlatform {
        calls: Mutex<Vec<String>>,
    }

    impl PlatformClient for MockPlatform {
        fn ban_member(&self, guild_id: u64, user_id: u64, _reason: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("ban:{guild_id}:{user_id}"));
            Ok(())
        }
        fn kick_member(&self, guild_id: u64, user_id: u64, _reason: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("kick:{guild_id}:{user_id}"));
            Ok(())
        }
        fn remove_role(&self, guild_id: u64, user_id: u64, role_id: u64, _reason: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("role:{guild_id}:{user_id}:{role_id}"));
            Ok(())
        }
        fn lockdown_guild(&self, guild_id: u64, _reason: &str) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(format!("lockdown:{guild_id}"));
            Ok(())
        }
    }

    #[test]
    fn ban_job_calls_ban_member() {
        let jobs = Arc::new(JobQueue::new(8));
        let concrete = Arc::new(MockPlatform { calls: Mutex::new(vec![]) });
        let platform: Arc<dyn PlatformClient> = concrete.clone();
        let dispatcher = Dispatcher::new(jobs, platform, None, Arc::new(crate::metrics::Metrics::new()));
        dispatcher.execute(
            0,
            JobRecord {
                job_type: JobType::Ban,
                event_type: crate::models::EventType::Ban,
                panic_mode: false,
                guild_id: 1,
                target_id: 2,
                reason: "test".into(),
                detection_time_ns: 0,
            },
        );
        assert_eq!(*concrete.calls.lock().unwrap(), vec!["ban:1:2".to_string()]);
    }
}
