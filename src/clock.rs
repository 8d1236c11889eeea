//! Monotonic clock primitives.
//!
//! The hot path (ring buffer, correlator, decision engine) never calls
//! `SystemTime::now()` — wall clock reads can jump backwards on NTP
//! correction. Everything downstream of ingest timestamps events with
//! `now_nanos()`, which is backed by `Instant`'s steady clock.

use std::time::Instant;

/// Process-wide reference point. All `now_nanos()` values are nanoseconds
/// elapsed since this instant, so they're comparable across threads but
/// not across process restarts.
static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Monotonic nanosecond timestamp, suitable for the `timestamp_ns` field
/// of event/alert/job records.
#[inline]
pub fn now_nanos() -> i64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as i64
}

/// Elapsed nanoseconds since `start`, saturating at zero if the clock
/// somehow disagrees (it shouldn't, `now_nanos` is monotonic).
#[inline]
pub fn elapsed_since(start_ns: i64) -> i64 {
    (now_nanos() - start_ns).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_non_decreasing() {
        let a = now_nanos();
        let b = now_nanos();
        assert!(b >= a);
    }

    #[test]
    fn elapsed_is_non_negative() {
        let start = now_nanos();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(elapsed_since(start) > 0);
    }
}
