//! Human-readable reason strings attached to every job, and the
//! heuristic that maps (severity, destructive-flag-count, multi-actor,
//! velocity) onto a concrete action.

use crate::models::{flags, EventType};

use super::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicResult {
    pub should_ban: bool,
    pub should_quarantine: bool,
    pub should_lockdown: bool,
    pub should_freeze: bool,
    pub confidence: u8,
}

pub fn count_destructive_flags(flag_bits: u32) -> u32 {
    (flag_bits & (flags::FLAG_BAN | flags::FLAG_CHANNEL | flags::FLAG_ROLE | flags::FLAG_PERMISSION)).count_ones()
}

pub fn should_escalate(flag_bits: u32, destructive_count: u32, velocity_value: u64) -> bool {
    let multi_actor = flag_bits & flags::FLAG_MULTI_ACTOR != 0;
    let velocity_flag = flag_bits & flags::FLAG_VELOCITY != 0;
    (multi_actor && destructive_count >= 2) || (velocity_flag && velocity_value > 20)
}

pub fn apply_heuristics(severity: Severity, flag_bits: u32) -> HeuristicResult {
    let destructive_count = count_destructive_flags(flag_bits);

    if destructive_count >= 3 {
        return HeuristicResult {
            should_ban: true,
            should_quarantine: false,
            should_lockdown: true,
            should_freeze: false,
            confidence: 95,
        };
    }
    if severity >= Severity::Critical {
        return HeuristicResult {
            should_ban: true,
            should_quarantine: false,
            should_lockdown: true,
            should_freeze: false,
            confidence: 90,
        };
    }
    if severity >= Severity::High {
        return HeuristicResult {
            should_ban: true,
            should_quarantine: true,
            should_lockdown: false,
            should_freeze: true,
            confidence: 85,
        };
    }
    if severity >= Severity::Medium {
        return HeuristicResult {
            should_ban: false,
            should_quarantine: true,
            should_lockdown: false,
            should_freeze: true,
            confidence: 75,
        };
    }
    HeuristicResult {
        should_ban: false,
        should_quarantine: false,
        should_lockdown: false,
        should_freeze: false,
        confidence: 80,
    }
}

/// Builds the human-readable string attached to a ban/kick/lockdown
/// audit reason.
pub fn build_reason(event_type: EventType, flag_bits: u32, panic_mode: bool) -> String {
    if panic_mode {
        return format!("Panic mode: {} detected, immediate action taken", event_type.human_name());
    }
    let mut parts = Vec::new();
    if flag_bits & flags::FLAG_BAN != 0 {
        parts.push("ban threshold");
    }
    if flag_bits & flags::FLAG_CHANNEL != 0 {
        parts.push("channel delete threshold");
    }
    if flag_bits & flags::FLAG_ROLE != 0 {
        parts.push("role delete threshold");
    }
    if flag_bits & flags::FLAG_WEBHOOK != 0 {
        parts.push("webhook creation threshold");
    }
    if flag_bits & flags::FLAG_PERMISSION != 0 {
        parts.push("permission escalation");
    }
    if flag_bits & flags::FLAG_VELOCITY != 0 {
        parts.push("action velocity");
    }
    if flag_bits & flags::FLAG_MULTI_ACTOR != 0 {
        parts.push("multi-actor coordination");
    }
    if parts.is_empty() {
        return format!("Suspicious {} activity", event_type.human_name());
    }
    format!("{} exceeded: {}", event_type.human_name(), parts.join(", "))
}
