//! Constant-time detectors run per event on the correlator thread.
//!
//! Each detector reads the counters it needs (already bumped by the
//! caller before the detector runs) and compares against the guild's
//! effective (safety-mode-scaled) thresholds. None of these allocate or
//! call out to anything — that's what keeps the correlator a
//! cache-resident hot loop.

use crate::models::flags;
use crate::state::guild::ThresholdSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorFlags(pub u32);

impl DetectorFlags {
    pub fn set(&mut self, bit: u32) {
        self.0 |= bit;
    }

    pub fn any(&self) -> bool {
        self.0 != 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

/// Threshold detector: has this counter crossed the guild's configured
/// limit for this action type?
pub fn threshold_exceeded(count: u64, threshold: u64) -> bool {
    count >= threshold
}

/// Velocity detector: delta since the last action, compared against the
/// guild's velocity limit. A delta of zero (first action ever) never
/// triggers.
pub fn velocity_exceeded(current_count: u64, last_count: u64, velocity_limit: u64) -> bool {
    let delta = current_count.saturating_sub(last_count);
    delta > 0 && delta >= velocity_limit
}

/// Permission-bitmask delta detector: did this change add any bit in
/// `critical_mask` that wasn't set before?
pub fn permission_escalated(before: u64, after: u64, critical_mask: u64) -> bool {
    let gained = after & !before;
    gained & critical_mask != 0
}

/// Multi-actor detector: does this guild's current hazard score
/// indicate a coordinated, multi-actor event rather than one rogue
/// actor? `hazard_score` is the guild's live score from
/// [`crate::state::hazard::HazardEntry`], already folding in distinct
/// actors, destructive-op count, and velocity.
pub fn multi_actor_hazard(hazard_score: u64, hazard_threshold: u64) -> bool {
    hazard_score >= hazard_threshold
}

/// Runs the full detector set for a destructive event and returns the
/// flags that fired.
pub struct DetectorInputs {
    pub ban_count: u64,
    pub kick_count: u64,
    pub chan_count: u64,
    pub role_count: u64,
    pub web_count: u64,
    pub perm_before: u64,
    pub perm_after: u64,
    pub critical_perm_mask: u64,
    pub velocity_current: u64,
    pub velocity_last: u64,
    pub distinct_actors: u64,
    pub hazard_score: u64,
    pub hazard_threshold: u64,
}

pub fn run_detectors(inputs: &DetectorInputs, thresholds: &ThresholdSet) -> DetectorFlags {
    let mut out = DetectorFlags::default();

    // Ban and kick share FlagBan (spec.md §4.6 groups them together; the
    // flag word has no dedicated bit for kicks).
    if threshold_exceeded(inputs.ban_count, thresholds.ban_threshold)
        || threshold_exceeded(inputs.kick_count, thresholds.kick_threshold)
    {
        out.set(flags::FLAG_BAN);
    }
    if threshold_exceeded(inputs.chan_count, thresholds.chan_threshold) {
        out.set(flags::FLAG_CHANNEL);
    }
    if threshold_exceeded(inputs.role_count, thresholds.role_threshold) {
        out.set(flags::FLAG_ROLE);
    }
    if threshold_exceeded(inputs.web_count, thresholds.web_threshold) {
        out.set(flags::FLAG_WEBHOOK);
    }
    if permission_escalated(inputs.perm_before, inputs.perm_after, inputs.critical_perm_mask) {
        out.set(flags::FLAG_PERMISSION);
    }
    if velocity_exceeded(inputs.velocity_current, inputs.velocity_last, thresholds.velocity_limit) {
        out.set(flags::FLAG_VELOCITY);
    }
    if inputs.distinct_actors > 1 && multi_actor_hazard(inputs.hazard_score, inputs.hazard_threshold) {
        out.set(flags::FLAG_MULTI_ACTOR);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_fires_at_exact_boundary() {
        assert!(threshold_exceeded(3, 3));
        assert!(!threshold_exceeded(2, 3));
    }

    #[test]
    fn velocity_ignores_zero_delta() {
        assert!(!velocity_exceeded(10, 10, 1));
    }

    #[test]
    fn velocity_fires_on_large_delta() {
        assert!(velocity_exceeded(25, 10, 15));
    }

    #[test]
    fn permission_escalation_requires_new_critical_bit() {
        let critical_mask = 0b1010;
        assert!(permission_escalated(0b0000, 0b0010, critical_mask));
        assert!(!permission_escalated(0b0010, 0b0011, critical_mask));
    }

    #[test]
    fn run_detectors_sets_multiple_flags() {
        let inputs = DetectorInputs {
            ban_count: 5,
            kick_count: 0,
            chan_count: 0,
            role_count: 0,
            web_count: 0,
            perm_before: 0,
            perm_after: 0,
            critical_perm_mask: 0,
            velocity_current: 0,
            velocity_last: 0,
            distinct_actors: 1,
            hazard_score: 0,
            hazard_threshold: 50,
        };
        let thresholds = ThresholdSet {
            ban_threshold: 3,
            kick_threshold: 8,
            chan_threshold: 2,
            role_threshold: 2,
            web_threshold: 5,
            perm_threshold: 5,
            velocity_limit: 10,
            window_ms: 100,
        };
        let flags = run_detectors(&inputs, &thresholds);
        assert!(flags.0 & crate::models::flags::FLAG_BAN != 0);
        assert_eq!(flags.count(), 1);
    }

    #[test]
    fn run_detectors_fires_ban_flag_on_kick_threshold() {
        let inputs = DetectorInputs {
            ban_count: 0,
            kick_count: 8,
            chan_count: 0,
            role_count: 0,
            web_count: 0,
            perm_before: 0,
            perm_after: 0,
            critical_perm_mask: 0,
            velocity_current: 0,
            velocity_last: 0,
            distinct_actors: 1,
            hazard_score: 0,
            hazard_threshold: 50,
        };
        let thresholds = ThresholdSet {
            ban_threshold: 3,
            kick_threshold: 8,
            chan_threshold: 2,
            role_threshold: 2,
            web_threshold: 5,
            perm_threshold: 5,
            velocity_limit: 10,
            window_ms: 100,
        };
        let flags = run_detectors(&inputs, &thresholds);
        assert!(flags.0 & crate::models::flags::FLAG_BAN != 0);
    }

    #[test]
    fn run_detectors_fires_multi_actor_flag_past_hazard_threshold() {
        let inputs = DetectorInputs {
            ban_count: 0,
            kick_count: 0,
            chan_count: 0,
            role_count: 0,
            web_count: 0,
            perm_before: 0,
            perm_after: 0,
            critical_perm_mask: 0,
            velocity_current: 0,
            velocity_last: 0,
            distinct_actors: 3,
            hazard_score: 55,
            hazard_threshold: 50,
        };
        let thresholds = ThresholdSet {
            ban_threshold: 3,
            kick_threshold: 8,
            chan_threshold: 2,
            role_threshold: 2,
            web_threshold: 5,
            perm_threshold: 5,
            velocity_limit: 10,
            window_ms: 100,
        };
        let flags = run_detectors(&inputs, &thresholds);
        assert!(flags.0 & crate::models::flags::FLAG_MULTI_ACTOR != 0);
    }
}
