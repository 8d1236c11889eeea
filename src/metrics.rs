use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

/// Process-wide metrics for the anti-nuke runtime.
///
/// Every field is updated from a hot path (ingest, correlator, decision,
/// or dispatcher workers) so everything here is atomic — no lock
/// contention between pipeline stages.
pub struct Metrics {
    pub events_total: AtomicU64,
    pub events_dropped_total: AtomicU64,
    pub alerts_emitted_total: AtomicU64,
    pub jobs_dispatched_total: AtomicU64,
    pub jobs_rate_limited_total: AtomicU64,
    pub bans_issued_total: AtomicU64,
    pub kicks_issued_total: AtomicU64,
    pub panic_mode_triggers_total: AtomicU64,
    pub fake_event_detections_total: AtomicU64,
    pub start_time: SystemTime,

    events_this_sec: AtomicU64,
    events_per_sec: AtomicU64,
    ring_overflows: AtomicU64,
    audit_cache_hits: AtomicU64,
    audit_cache_misses: AtomicU64,
    http_errors_total: AtomicU64,
    active_guilds: AtomicUsize,
    watchdog_unhealthy: AtomicBool,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_dropped_total: AtomicU64::new(0),
            alerts_emitted_total: AtomicU64::new(0),
            jobs_dispatched_total: AtomicU64::new(0),
            jobs_rate_limited_total: AtomicU64::new(0),
            bans_issued_total: AtomicU64::new(0),
            kicks_issued_total: AtomicU64::new(0),
            panic_mode_triggers_total: AtomicU64::new(0),
            fake_event_detections_total: AtomicU64::new(0),
            start_time: SystemTime::now(),
            events_this_sec: AtomicU64::new(0),
            events_per_sec: AtomicU64::new(0),
            ring_overflows: AtomicU64::new(0),
            audit_cache_hits: AtomicU64::new(0),
            audit_cache_misses: AtomicU64::new(0),
            http_errors_total: AtomicU64::new(0),
            active_guilds: AtomicUsize::new(0),
            watchdog_unhealthy: AtomicBool::new(false),
        }
    }

    /// Records an incoming event, returning whether the caller should
    /// keep processing it or treat it as sampled-out under `cap`.
    /// Destructive event types (ban/channel-delete/role-delete, encoded
    /// as `priority >= 2`) are never sampled out — only low-priority
    /// chatter gets thinned under sustained overload.
    pub fn record_event(&self, cap: u64, priority: u8) -> bool {
        const SAMPLE_N: u64 = 10;
        let count = self.events_this_sec.fetch_add(1, Ordering::Relaxed) + 1;
        self.events_total.fetch_add(1, Ordering::Relaxed);
        if cap > 0 && count > cap {
            if priority >= 2 {
                return true;
            }
            if count % SAMPLE_N != 0 {
                self.events_dropped_total.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    /// Refreshes the events-per-second gauge. Called once a second from
    /// the watchdog loop.
    pub fn rollup(&self) {
        let per_sec = self.events_this_sec.swap(0, Ordering::Relaxed);
        self.events_per_sec.store(per_sec, Ordering::Relaxed);
    }

    pub fn events_per_sec(&self) -> u64 {
        self.events_per_sec.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().map(|d| d.as_secs()).unwrap_or(0)
    }

    pub fn inc_ring_overflow(&self) {
        self.ring_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ring_overflows(&self) -> u64 {
        self.ring_overflows.load(Ordering::Relaxed)
    }

    pub fn inc_alerts_emitted(&self) {
        self.alerts_emitted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_dispatched(&self) {
        self.jobs_dispatched_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_rate_limited(&self) {
        self.jobs_rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_bans_issued(&self) {
        self.bans_issued_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_kicks_issued(&self) {
        self.kicks_issued_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_panic_mode_trigger(&self) {
        self.panic_mode_triggers_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fake_event_detection(&self) {
        self.fake_event_detections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audit_cache_hit(&self) {
        self.audit_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audit_cache_miss(&self) {
        self.audit_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn audit_cache_hit_ratio(&self) -> f64 {
        let hits = self.audit_cache_hits.load(Ordering::Relaxed) as f64;
        let misses = self.audit_cache_misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            return 0.0;
        }
        hits / (hits + misses)
    }

    pub fn inc_http_error(&self) {
        self.http_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn http_errors(&self) -> u64 {
        self.http_errors_total.load(Ordering::Relaxed)
    }

    pub fn set_active_guilds(&self, count: usize) {
        self.active_guilds.store(count, Ordering::Relaxed);
    }

    pub fn active_guilds(&self) -> usize {
        self.active_guilds.load(Ordering::Relaxed)
    }

    pub fn set_watchdog_unhealthy(&self, unhealthy: bool) {
        self.watchdog_unhealthy.store(unhealthy, Ordering::Relaxed);
    }

    pub fn watchdog_unhealthy(&self) -> bool {
        self.watchdog_unhealthy.load(Ordering::Relaxed)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_events_trigger_sampling_for_low_priority() {
        let m = Metrics::new();
        let cap = 5;
        let mut processed = 0;
        for _ in 0..100 {
            if m.record_event(cap, 0) {
                processed += 1;
            }
        }
        assert!(processed < 100);
        assert!(m.events_dropped_total.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn destructive_events_are_never_sampled_out() {
        let m = Metrics::new();
        let cap = 5;
        let mut processed = 0;
        for _ in 0..100 {
            if m.record_event(cap, 2) {
                processed += 1;
            }
        }
        assert_eq!(processed, 100);
    }

    #[test]
    fn audit_cache_ratio_tracks_hits_and_misses() {
        let m = Metrics::new();
        m.inc_audit_cache_hit();
        m.inc_audit_cache_hit();
        m.inc_audit_cache_miss();
        assert!((m.audit_cache_hit_ratio() - 0.6666).abs() < 0.01);
    }
}
