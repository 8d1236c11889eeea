//! Panic-mode fast path.
//!
//! When a guild's operator has flipped on panic mode (or the runtime's
//! global `detection.panic_mode` default is set), every destructive
//! event bypasses thresholds, velocity, and hazard scoring entirely —
//! the actor is banned on the first offense. This exists for the "we're
//! actively being raided right now" moment where waiting for a second
//! data point is itself the failure.

use crate::models::{flags, EventType};

pub fn should_fast_path_ban(panic_mode: bool, event_type: EventType) -> bool {
    panic_mode && event_type.is_destructive()
}

/// Flag the panic-mode fast path emits for a given event type: ban ->
/// FlagBan, channel* -> FlagChannel, role* -> FlagRole, everything else
/// (kick, webhook, ...) defaults to FlagBan.
pub fn fast_path_flag(event_type: EventType) -> u32 {
    match event_type {
        EventType::ChannelCreate | EventType::ChannelUpdate | EventType::ChannelDelete => {
            flags::FLAG_CHANNEL
        }
        EventType::RoleCreate | EventType::RoleUpdate | EventType::RoleDelete => flags::FLAG_ROLE,
        _ => flags::FLAG_BAN,
    }
}
