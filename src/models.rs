//! Wire-stable record types that flow through the ring/alert/job queues.
//!
//! These are value types by design (spec §3: "the ring stores values, not
//! references"). Every queue byte-copies them in and out of preallocated
//! slots; none of them may contain a heap pointer on the hot path, so
//! `reason` on [`JobRecord`] is the one exception — it's built once in the
//! decision engine, off the per-event hot path, and consumed once by a
//! dispatcher worker.

use serde::{Deserialize, Serialize};

/// The ~26 platform actions the system cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    Unknown = 0,
    Ban = 1,
    Unban = 2,
    Kick = 3,
    MemberRemove = 4,
    MemberAdd = 5,
    ChannelCreate = 10,
    ChannelUpdate = 11,
    ChannelDelete = 12,
    RoleCreate = 30,
    RoleUpdate = 31,
    RoleDelete = 32,
    WebhookCreate = 50,
    WebhookUpdate = 51,
    WebhookDelete = 52,
    EmojiCreate = 60,
    EmojiUpdate = 61,
    EmojiDelete = 62,
    IntegrationCreate = 80,
    IntegrationUpdate = 81,
    IntegrationDelete = 82,
    GuildUpdate = 90,
    GuildCreate = 91,
}

impl EventType {
    /// Maps a platform audit-log action code (spec §6) to an `EventType`.
    pub fn from_action_code(code: u16) -> Self {
        match code {
            1 => EventType::GuildUpdate,
            10 => EventType::ChannelCreate,
            11 => EventType::ChannelUpdate,
            12 => EventType::ChannelDelete,
            20 => EventType::Kick,
            22 => EventType::Ban,
            23 => EventType::Unban,
            24 => EventType::MemberAdd,
            28 => EventType::MemberAdd,
            30 => EventType::RoleCreate,
            31 => EventType::RoleUpdate,
            32 => EventType::RoleDelete,
            50 => EventType::WebhookCreate,
            51 => EventType::WebhookUpdate,
            52 => EventType::WebhookDelete,
            60 => EventType::EmojiCreate,
            61 => EventType::EmojiUpdate,
            62 => EventType::EmojiDelete,
            80 => EventType::IntegrationCreate,
            81 => EventType::IntegrationUpdate,
            82 => EventType::IntegrationDelete,
            _ => EventType::Unknown,
        }
    }

    /// Maps the `repr(u8)` discriminant back to `EventType`. Used to
    /// reconstruct the type from a queue record's bare `u8` field; unlike
    /// the discriminant values, platform audit action codes (see
    /// [`Self::from_action_code`]) live in a different number space.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => EventType::Unknown,
            1 => EventType::Ban,
            2 => EventType::Unban,
            3 => EventType::Kick,
            4 => EventType::MemberRemove,
            5 => EventType::MemberAdd,
            10 => EventType::ChannelCreate,
            11 => EventType::ChannelUpdate,
            12 => EventType::ChannelDelete,
            30 => EventType::RoleCreate,
            31 => EventType::RoleUpdate,
            32 => EventType::RoleDelete,
            50 => EventType::WebhookCreate,
            51 => EventType::WebhookUpdate,
            52 => EventType::WebhookDelete,
            60 => EventType::EmojiCreate,
            61 => EventType::EmojiUpdate,
            62 => EventType::EmojiDelete,
            80 => EventType::IntegrationCreate,
            81 => EventType::IntegrationUpdate,
            82 => EventType::IntegrationDelete,
            90 => EventType::GuildUpdate,
            91 => EventType::GuildCreate,
            _ => EventType::Unknown,
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            EventType::Ban
                | EventType::Kick
                | EventType::ChannelDelete
                | EventType::RoleDelete
                | EventType::WebhookCreate
                | EventType::WebhookDelete
        )
    }

    /// Human name used in ban/kick reason strings (decision::reasons).
    pub fn human_name(self) -> &'static str {
        match self {
            EventType::Ban => "Ban",
            EventType::Kick => "Kick",
            EventType::ChannelDelete => "Channel Delete",
            EventType::ChannelCreate => "Channel Create",
            EventType::RoleDelete => "Role Delete",
            EventType::RoleCreate => "Role Create",
            EventType::WebhookCreate => "Webhook Create",
            EventType::WebhookUpdate | EventType::RoleUpdate | EventType::GuildUpdate => {
                "Permission Change"
            }
            _ => "Suspicious Activity",
        }
    }
}

/// Alert/flag bit positions (spec §4.6).
pub mod flags {
    pub const FLAG_BAN: u32 = 1 << 0;
    pub const FLAG_CHANNEL: u32 = 1 << 1;
    pub const FLAG_ROLE: u32 = 1 << 2;
    pub const FLAG_WEBHOOK: u32 = 1 << 3;
    pub const FLAG_PERMISSION: u32 = 1 << 4;
    pub const FLAG_VELOCITY: u32 = 1 << 5;
    pub const FLAG_MULTI_ACTOR: u32 = 1 << 6;
    pub const FLAG_LOCKDOWN_ACTIVE: u32 = 1 << 7;
}

/// 16-byte-aligned fixed-layout event record, the unit the ring buffer
/// copies. `#[repr(C)]` keeps field order and size stable across builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct EventRecord {
    pub event_type: u8,
    pub priority: u8,
    pub flags: u16,
    pub guild_id: u64,
    pub actor_id: u64,
    pub target_id: u64,
    pub metadata: u64,
    pub timestamp_ns: i64,
}

impl Default for EventRecord {
    fn default() -> Self {
        EventRecord {
            event_type: EventType::Unknown as u8,
            priority: 0,
            flags: 0,
            guild_id: 0,
            actor_id: 0,
            target_id: 0,
            metadata: 0,
            timestamp_ns: 0,
        }
    }
}

impl EventRecord {
    pub fn kind(&self) -> EventType {
        EventType::from_u8(self.event_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct AlertRecord {
    pub guild_id: u64,
    pub actor_id: u64,
    pub target_id: u64,
    pub event_type: u8,
    pub severity: u8,
    pub panic_mode: u8,
    pub flags: u32,
    pub timestamp_ns: i64,
}

impl Default for AlertRecord {
    fn default() -> Self {
        AlertRecord {
            guild_id: 0,
            actor_id: 0,
            target_id: 0,
            event_type: EventType::Unknown as u8,
            severity: 0,
            panic_mode: 0,
            flags: 0,
            timestamp_ns: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Ban,
    Kick,
    Quarantine,
    Lockdown,
    RoleRemove,
}

/// Job record. Unlike the other two, this one carries a heap-allocated
/// `reason` — it's built once by the decision engine and read once by a
/// dispatcher worker, never copied through a hot SPSC ring at per-event
/// rate (the job queue runs at alert rate, orders of magnitude lower).
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_type: JobType,
    pub event_type: EventType,
    pub panic_mode: bool,
    pub guild_id: u64,
    pub target_id: u64,
    pub reason: String,
    pub detection_time_ns: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_roundtrips_through_action_code() {
        assert_eq!(EventType::from_action_code(22), EventType::Ban);
        assert_eq!(EventType::from_action_code(12), EventType::ChannelDelete);
        assert_eq!(EventType::from_action_code(9999), EventType::Unknown);
    }

    #[test]
    fn event_type_discriminant_roundtrips_through_from_u8() {
        for kind in [
            EventType::Unknown,
            EventType::Ban,
            EventType::Kick,
            EventType::ChannelDelete,
            EventType::RoleUpdate,
            EventType::WebhookDelete,
            EventType::IntegrationCreate,
            EventType::GuildCreate,
        ] {
            assert_eq!(EventType::from_u8(kind as u8), kind);
        }
        assert_eq!(EventType::from_u8(200), EventType::Unknown);
    }

    #[test]
    fn event_record_default_is_zeroed() {
        let e = EventRecord::default();
        assert_eq!(e.guild_id, 0);
        assert_eq!(e.kind(), EventType::Unknown);
    }

    #[test]
    fn record_sizes_are_stable() {
        assert_eq!(std::mem::size_of::<EventRecord>(), 48);
        assert_eq!(std::mem::align_of::<EventRecord>(), 16);
    }
}
