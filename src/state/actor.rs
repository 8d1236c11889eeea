//! Per-actor counters and sticky flag bits.
//!
//! Bit 31 of `flags` is the "triggered" sticky bit (matches the source
//! system's `FlagsSet & 0x80000000` convention); bit 30 is "banned".
//! Both are set via CAS retry loops so a concurrent counter-bump never
//! clobbers a flag set by another thread.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub const MAX_ACTORS: usize = 16384;

pub const TRIGGERED_BIT: u32 = 0x8000_0000;
pub const BANNED_BIT: u32 = 0x4000_0000;

#[repr(C, align(64))]
pub struct ActorCounters {
    pub ban_count: AtomicU64,
    pub kick_count: AtomicU64,
    pub channel_delete: AtomicU64,
    pub role_delete: AtomicU64,
    pub webhook_create: AtomicU64,
    pub perm_change: AtomicU64,
    pub total_actions: AtomicU64,
    pub threat_level: AtomicU32,
    pub last_action_time: AtomicU64,
    pub first_seen_time: AtomicU64,
    pub flags: AtomicU32,
}

impl Default for ActorCounters {
    fn default() -> Self {
        ActorCounters {
            ban_count: AtomicU64::new(0),
            kick_count: AtomicU64::new(0),
            channel_delete: AtomicU64::new(0),
            role_delete: AtomicU64::new(0),
            webhook_create: AtomicU64::new(0),
            perm_change: AtomicU64::new(0),
            total_actions: AtomicU64::new(0),
            threat_level: AtomicU32::new(0),
            last_action_time: AtomicU64::new(0),
            first_seen_time: AtomicU64::new(0),
            flags: AtomicU32::new(0),
        }
    }
}

impl ActorCounters {
    fn set_bit(&self, bit: u32) -> bool {
        let mut current = self.flags.load(Ordering::Relaxed);
        loop {
            if current & bit != 0 {
                return false;
            }
            match self.flags.compare_exchange_weak(
                current,
                current | bit,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Sets the triggered bit. Returns `true` if this call was the one
    /// that set it (first trigger), `false` if already triggered.
    pub fn set_triggered(&self) -> bool {
        self.set_bit(TRIGGERED_BIT)
    }

    pub fn is_triggered(&self) -> bool {
        self.flags.load(Ordering::Acquire) & TRIGGERED_BIT != 0
    }

    /// Sets the banned bit. Returns `true` if this call won the race to
    /// ban (callers should only actually issue the ban request once).
    pub fn try_set_banned(&self) -> bool {
        self.set_bit(BANNED_BIT)
    }

    pub fn is_banned(&self) -> bool {
        self.flags.load(Ordering::Acquire) & BANNED_BIT != 0
    }

    pub fn reset(&self) {
        self.ban_count.store(0, Ordering::Relaxed);
        self.kick_count.store(0, Ordering::Relaxed);
        self.channel_delete.store(0, Ordering::Relaxed);
        self.role_delete.store(0, Ordering::Relaxed);
        self.webhook_create.store(0, Ordering::Relaxed);
        self.perm_change.store(0, Ordering::Relaxed);
        self.total_actions.store(0, Ordering::Relaxed);
        self.threat_level.store(0, Ordering::Relaxed);
        self.last_action_time.store(0, Ordering::Relaxed);
        self.first_seen_time.store(0, Ordering::Relaxed);
        self.flags.store(0, Ordering::Relaxed);
    }

    pub fn record_action(&self, now_ns: i64) {
        self.total_actions.fetch_add(1, Ordering::Relaxed);
        if self.first_seen_time.load(Ordering::Relaxed) == 0 {
            self.first_seen_time
                .compare_exchange(0, now_ns as u64, Ordering::AcqRel, Ordering::Relaxed)
                .ok();
        }
        self.last_action_time.store(now_ns as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone)]
pub struct ActorProfile {
    pub actor_id: u64,
    pub whitelisted: bool,
    pub trust_score: i32,
    pub is_owner: bool,
    /// True when this actor is the bot's own account. The bot's own
    /// moderation actions (bans, kicks, role removals it issues) must
    /// never be correlated back into a self-inflicted detection.
    pub is_self: bool,
}

impl ActorProfile {
    pub fn new(actor_id: u64) -> Self {
        ActorProfile {
            actor_id,
            whitelisted: false,
            trust_score: 0,
            is_owner: false,
            is_self: false,
        }
    }

    pub fn is_immune(&self) -> bool {
        self.whitelisted || self.is_owner || self.is_self
    }
}
