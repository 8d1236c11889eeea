//! Per-guild counters, profile and threshold matrix.
//!
//! `GuildCounters` is the hot-path-written half (every destructive event
//! bumps one field); `GuildProfile` is the cold-path-written half
//! (joined/configured rarely). Kept as separate preallocated arrays so a
//! profile update never invalidates the cache line a detector is
//! spinning on.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

pub const MAX_GUILDS: usize = 8192;

/// `#[repr(C, align(64))]` keeps one guild's counters inside a single
/// cache line pair, so two guilds' detectors never false-share.
#[repr(C, align(64))]
pub struct GuildCounters {
    pub ban_count: AtomicU64,
    pub kick_count: AtomicU64,
    pub channel_delete: AtomicU64,
    pub role_delete: AtomicU64,
    pub webhook_create: AtomicU64,
    pub perm_change: AtomicU64,
    pub member_remove: AtomicU64,
    pub last_ban_time: AtomicU64,
    pub last_chan_time: AtomicU64,
    pub last_role_time: AtomicU64,
    pub last_web_time: AtomicU64,
    pub velocity_score: AtomicU64,
    /// Snapshot of `velocity_score` as of the last time the velocity
    /// detector ran, so it can compare against the delta rather than the
    /// running total.
    pub last_velocity: AtomicU64,
    pub trigger_flags: AtomicU32,
    pub lockdown_active: AtomicBool,
}

impl Default for GuildCounters {
    fn default() -> Self {
        GuildCounters {
            ban_count: AtomicU64::new(0),
            kick_count: AtomicU64::new(0),
            channel_delete: AtomicU64::new(0),
            role_delete: AtomicU64::new(0),
            webhook_create: AtomicU64::new(0),
            perm_change: AtomicU64::new(0),
            member_remove: AtomicU64::new(0),
            last_ban_time: AtomicU64::new(0),
            last_chan_time: AtomicU64::new(0),
            last_role_time: AtomicU64::new(0),
            last_web_time: AtomicU64::new(0),
            velocity_score: AtomicU64::new(0),
            last_velocity: AtomicU64::new(0),
            trigger_flags: AtomicU32::new(0),
            lockdown_active: AtomicBool::new(false),
        }
    }
}

impl GuildCounters {
    pub fn reset(&self) {
        self.ban_count.store(0, Ordering::Relaxed);
        self.kick_count.store(0, Ordering::Relaxed);
        self.channel_delete.store(0, Ordering::Relaxed);
        self.role_delete.store(0, Ordering::Relaxed);
        self.webhook_create.store(0, Ordering::Relaxed);
        self.perm_change.store(0, Ordering::Relaxed);
        self.member_remove.store(0, Ordering::Relaxed);
        self.last_ban_time.store(0, Ordering::Relaxed);
        self.last_chan_time.store(0, Ordering::Relaxed);
        self.last_role_time.store(0, Ordering::Relaxed);
        self.last_web_time.store(0, Ordering::Relaxed);
        self.velocity_score.store(0, Ordering::Relaxed);
        self.last_velocity.store(0, Ordering::Relaxed);
        self.trigger_flags.store(0, Ordering::Relaxed);
        self.lockdown_active.store(false, Ordering::Relaxed);
    }

    pub fn set_lockdown(&self, active: bool) {
        self.lockdown_active.store(active, Ordering::Release);
    }

    pub fn is_lockdown(&self) -> bool {
        self.lockdown_active.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl SizeClass {
    pub fn from_member_count(size: u64) -> Self {
        if size < 100 {
            SizeClass::Tiny
        } else if size < 1000 {
            SizeClass::Small
        } else if size < 5000 {
            SizeClass::Medium
        } else if size < 20_000 {
            SizeClass::Large
        } else {
            SizeClass::Huge
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyMode {
    Normal,
    Elevated,
    High,
    Lockdown,
    Paranoid,
}

impl SafetyMode {
    /// Multiplier applied to every threshold in [`ThresholdMatrix`]; the
    /// more aggressive the mode, the lower the multiplier, floored at 1
    /// so a threshold never collapses to zero (which would trigger on
    /// the very first legitimate action).
    pub fn multiplier(self) -> f64 {
        match self {
            SafetyMode::Normal => 1.0,
            SafetyMode::Elevated => 0.8,
            SafetyMode::High => 0.6,
            SafetyMode::Lockdown => 0.4,
            SafetyMode::Paranoid => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThresholdSet {
    pub ban_threshold: u64,
    pub kick_threshold: u64,
    pub chan_threshold: u64,
    pub role_threshold: u64,
    pub web_threshold: u64,
    pub perm_threshold: u64,
    pub velocity_limit: u64,
    /// Window the above counts are measured over. Not scaled by safety
    /// mode — it's a time span, not a trigger count.
    pub window_ms: u64,
}

impl ThresholdSet {
    pub fn scaled(&self, mode: SafetyMode) -> ThresholdSet {
        let m = mode.multiplier();
        let scale = |v: u64| ((v as f64 * m).round() as u64).max(1);
        ThresholdSet {
            ban_threshold: scale(self.ban_threshold),
            kick_threshold: scale(self.kick_threshold),
            chan_threshold: scale(self.chan_threshold),
            role_threshold: scale(self.role_threshold),
            web_threshold: scale(self.web_threshold),
            perm_threshold: scale(self.perm_threshold),
            velocity_limit: scale(self.velocity_limit),
            window_ms: self.window_ms,
        }
    }
}

pub const DEFAULT_THRESHOLDS: [(SizeClass, ThresholdSet); 5] = [
    (
        SizeClass::Tiny,
        ThresholdSet {
            ban_threshold: 3,
            kick_threshold: 5,
            chan_threshold: 1,
            role_threshold: 1,
            web_threshold: 5,
            perm_threshold: 3,
            velocity_limit: 10,
            window_ms: 100,
        },
    ),
    (
        SizeClass::Small,
        ThresholdSet {
            ban_threshold: 5,
            kick_threshold: 8,
            chan_threshold: 1,
            role_threshold: 1,
            web_threshold: 8,
            perm_threshold: 5,
            velocity_limit: 15,
            window_ms: 100,
        },
    ),
    (
        SizeClass::Medium,
        ThresholdSet {
            ban_threshold: 7,
            kick_threshold: 12,
            chan_threshold: 5,
            role_threshold: 5,
            web_threshold: 10,
            perm_threshold: 7,
            velocity_limit: 20,
            window_ms: 150,
        },
    ),
    (
        SizeClass::Large,
        ThresholdSet {
            ban_threshold: 10,
            kick_threshold: 15,
            chan_threshold: 7,
            role_threshold: 7,
            web_threshold: 15,
            perm_threshold: 10,
            velocity_limit: 30,
            window_ms: 200,
        },
    ),
    (
        SizeClass::Huge,
        ThresholdSet {
            ban_threshold: 15,
            kick_threshold: 20,
            chan_threshold: 10,
            role_threshold: 10,
            web_threshold: 20,
            perm_threshold: 15,
            velocity_limit: 40,
            window_ms: 250,
        },
    ),
];

pub fn thresholds_for(class: SizeClass) -> ThresholdSet {
    DEFAULT_THRESHOLDS
        .iter()
        .find(|(c, _)| *c == class)
        .map(|(_, t)| *t)
        .expect("DEFAULT_THRESHOLDS covers every SizeClass variant")
}

/// Cold-path configuration/profile data for one guild.
#[derive(Debug, Clone)]
pub struct GuildProfile {
    pub guild_id: u64,
    pub member_count: u64,
    pub enabled: bool,
    pub safety_mode: SafetyMode,
    pub thresholds: ThresholdSet,
}

impl GuildProfile {
    pub fn new(guild_id: u64, member_count: u64) -> Self {
        let class = SizeClass::from_member_count(member_count);
        GuildProfile {
            guild_id,
            member_count,
            enabled: true,
            safety_mode: SafetyMode::Normal,
            thresholds: thresholds_for(class),
        }
    }

    pub fn effective_thresholds(&self) -> ThresholdSet {
        self.thresholds.scaled(self.safety_mode)
    }
}
