//! End-to-end pipeline scenarios from spec.md §8, driving the real
//! correlator/decision/dispatcher stages through their public APIs
//! instead of re-testing each stage's internals in isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sentinel_core::correlator::Correlator;
use sentinel_core::decision::DecisionEngine;
use sentinel_core::dispatcher::Dispatcher;
use sentinel_core::metrics::Metrics;
use sentinel_core::models::{EventRecord, EventType, JobType};
use sentinel_core::platform::PlatformClient;
use sentinel_core::queue::alert_queue::AlertQueue;
use sentinel_core::queue::job_queue::JobQueue;
use sentinel_core::state::PreallocatedState;

struct RecordingPlatform {
    calls: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    fn new() -> Self {
        RecordingPlatform { calls: Mutex::new(Vec::new()) }
    }
}

impl PlatformClient for RecordingPlatform {
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

fn channel_delete_event(guild_id: u64, actor_id: u64, target_id: u64) -> EventRecord {
    EventRecord {
        event_type: EventType::ChannelDelete as u8,
        guild_id,
        actor_id,
        target_id,
        ..Default::default()
    }
}

/// Runs a dispatcher with one worker against a fresh job queue + mock
/// platform, long enough to drain whatever jobs are already queued, then
/// shuts it down and returns the recorded calls.
fn drain_jobs_through_dispatcher(jobs: Arc<JobQueue>) -> Vec<String> {
    let platform = Arc::new(RecordingPlatform::new());
    let platform_dyn: Arc<dyn PlatformClient> = platform.clone();
    let dispatcher = Arc::new(Dispatcher::new(jobs.clone(), platform_dyn, None, Arc::new(Metrics::new())));
    let running = Arc::new(AtomicBool::new(true));
    let watchdog = Arc::new(sentinel_core::watchdog::Watchdog::new());
    watchdog.register("dispatcher", std::time::Duration::from_secs(10));
    let handles = dispatcher.spawn_workers(1, running.clone(), watchdog);

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while !jobs.is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    // give the worker a moment to finish executing the job it just popped
    std::thread::sleep(std::time::Duration::from_millis(20));
    running.store(false, Ordering::Relaxed);
    for h in handles {
        h.join().unwrap();
    }

    let calls = platform.calls.lock().unwrap().clone();
    calls
}

/// Scenario 1: single-actor channel nuke, normal mode, MEDIUM guild.
#[test]
fn scenario_single_actor_channel_nuke() {
    let state = Arc::new(PreallocatedState::new());
    // member_count 2000 -> SizeClass::Medium -> chan_threshold = 5.
    state.register_guild(1, 2000);

    let alerts = Arc::new(AlertQueue::new(64));
    let correlator = Correlator::new(state.clone(), alerts.clone(), Arc::new(Metrics::new()), true, false);

    for _ in 0..4 {
        correlator.process_event(&channel_delete_event(1, 2, 3));
    }
    assert!(alerts.is_empty(), "first four channel deletes must not trigger an alert");

    correlator.process_event(&channel_delete_event(1, 2, 3));
    let alert = alerts.pop().expect("fifth channel delete crosses the threshold");
    assert_eq!(alert.flags & sentinel_core::models::flags::FLAG_CHANNEL, sentinel_core::models::flags::FLAG_CHANNEL);
    assert_eq!(alert.panic_mode, 0);

    let jobs = Arc::new(JobQueue::new(64));
    let decision = DecisionEngine::new(state.clone(), alerts.clone(), jobs.clone(), None, Arc::new(Metrics::new()));
    decision.process_alert(&alert);

    let ban_job = (0..jobs.len())
        .filter_map(|_| jobs.pop())
        .find(|j| j.job_type == JobType::Ban)
        .expect("channel-delete threshold crossing should produce a ban job");
    assert_eq!(ban_job.target_id, 2);
    assert!(ban_job.reason.contains("Channel Delete"), "reason was: {}", ban_job.reason);

    let jobs2 = Arc::new(JobQueue::new(8));
    jobs2.push(ban_job);
    let calls = drain_jobs_through_dispatcher(jobs2);
    assert_eq!(calls, vec!["ban:1:2".to_string()]);
}

/// Scenario 2: panic mode bans on the first destructive event and emits
/// exactly one job (no kick, no lockdown, no quarantine).
#[test]
fn scenario_panic_mode_single_ban_no_other_jobs() {
    let state = Arc::new(PreallocatedState::new());
    state.register_guild(1, 2000);

    let alerts = Arc::new(AlertQueue::new(64));
    let correlator = Correlator::new(state.clone(), alerts.clone(), Arc::new(Metrics::new()), true, true);

    let event = EventRecord {
        event_type: EventType::RoleDelete as u8,
        guild_id: 1,
        actor_id: 9,
        target_id: 3,
        ..Default::default()
    };
    correlator.process_event(&event);

    let alert = alerts.pop().expect("panic mode must emit an alert on the very first destructive event");
    assert_eq!(alert.panic_mode, 1);
    assert_eq!(alert.flags, sentinel_core::models::flags::FLAG_ROLE);
    assert!(alerts.is_empty());

    let jobs = Arc::new(JobQueue::new(64));
    let decision = DecisionEngine::new(state.clone(), alerts.clone(), jobs.clone(), None, Arc::new(Metrics::new()));
    decision.process_alert(&alert);

    let mut produced = Vec::new();
    while let Some(job) = jobs.pop() {
        produced.push(job.job_type);
    }
    assert_eq!(produced, vec![JobType::Ban], "panic mode must emit exactly one ban job, nothing else");
}

/// Scenario 3: owner immunity. Destructive events from the guild owner
/// never reach the detector pipeline, regardless of volume.
#[test]
fn scenario_owner_is_immune_to_detection() {
    let state = Arc::new(PreallocatedState::new());
    state.register_guild(1, 2000);
    let actor_slot = state.register_actor(42);
    state.with_actor_profile_mut(actor_slot, |p| p.is_owner = true);

    let alerts = Arc::new(AlertQueue::new(64));
    let correlator = Correlator::new(state.clone(), alerts.clone(), Arc::new(Metrics::new()), true, false);

    for _ in 0..20 {
        correlator.process_event(&channel_delete_event(1, 42, 3));
    }
    assert!(alerts.is_empty(), "owner's destructive events must never produce an alert");
}
