pub mod actor;
pub mod guild;
pub mod hazard;
pub mod index;

use std::collections::HashMap;
use std::sync::RwLock;

use actor::{ActorCounters, ActorProfile, MAX_ACTORS};
use guild::{GuildCounters, GuildProfile, MAX_GUILDS};
use hazard::HazardEntry;
use index::DenseIndex;

/// All preallocated, fixed-capacity state the runtime touches per event.
/// Built once at startup; every array is sized up front so the hot path
/// never grows a collection.
pub struct PreallocatedState {
    pub guild_counters: Vec<GuildCounters>,
    pub actor_counters: Vec<ActorCounters>,
    pub guild_index: DenseIndex,
    pub actor_index: DenseIndex,
    guild_profiles: RwLock<Vec<Option<GuildProfile>>>,
    actor_profiles: RwLock<Vec<Option<ActorProfile>>>,
    pub hazard: Vec<std::sync::Mutex<HazardEntry>>,
    /// Last-seen permission bitmask per role, keyed by platform role ID.
    /// Cold path (one write per role update) so a plain `RwLock<HashMap>`
    /// is fine here, unlike the per-event counter arrays above.
    role_perms: RwLock<HashMap<u64, u64>>,
}

impl PreallocatedState {
    pub fn new() -> Self {
        let mut guild_counters = Vec::with_capacity(MAX_GUILDS);
        guild_counters.resize_with(MAX_GUILDS, GuildCounters::default);

        let mut actor_counters = Vec::with_capacity(MAX_ACTORS);
        actor_counters.resize_with(MAX_ACTORS, ActorCounters::default);

        let mut guild_profiles = Vec::with_capacity(MAX_GUILDS);
        guild_profiles.resize_with(MAX_GUILDS, || None);

        let mut actor_profiles = Vec::with_capacity(MAX_ACTORS);
        actor_profiles.resize_with(MAX_ACTORS, || None);

        let mut hazard = Vec::with_capacity(hazard::MAX_HAZARD_ENTRIES);
        hazard.resize_with(hazard::MAX_HAZARD_ENTRIES, || {
            std::sync::Mutex::new(HazardEntry::default())
        });

        PreallocatedState {
            guild_counters,
            actor_counters,
            guild_index: DenseIndex::new(MAX_GUILDS as u32, "guild"),
            actor_index: DenseIndex::new(MAX_ACTORS as u32, "actor"),
            guild_profiles: RwLock::new(guild_profiles),
            actor_profiles: RwLock::new(actor_profiles),
            hazard,
            role_perms: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a guild (or returns its existing slot) and ensures a
    /// profile exists, creating a default one sized by `member_count` on
    /// first sight.
    pub fn register_guild(&self, guild_id: u64, member_count: u64) -> u32 {
        let slot = self.guild_index.get_or_insert(guild_id);
        if slot == 0 {
            return 0;
        }
        let mut profiles = self.guild_profiles.write().expect("guild profiles poisoned");
        if profiles[slot as usize].is_none() {
            profiles[slot as usize] = Some(GuildProfile::new(guild_id, member_count));
        }
        slot
    }

    pub fn register_actor(&self, actor_id: u64) -> u32 {
        let slot = self.actor_index.get_or_insert(actor_id);
        if slot == 0 {
            return 0;
        }
        let mut profiles = self.actor_profiles.write().expect("actor profiles poisoned");
        if profiles[slot as usize].is_none() {
            profiles[slot as usize] = Some(ActorProfile::new(actor_id));
        }
        slot
    }

    pub fn guild_counters(&self, slot: u32) -> Option<&GuildCounters> {
        if slot == 0 {
            return None;
        }
        self.guild_counters.get(slot as usize)
    }

    pub fn actor_counters(&self, slot: u32) -> Option<&ActorCounters> {
        if slot == 0 {
            return None;
        }
        self.actor_counters.get(slot as usize)
    }

    pub fn with_guild_profile<R>(&self, slot: u32, f: impl FnOnce(&GuildProfile) -> R) -> Option<R> {
        if slot == 0 {
            return None;
        }
        let profiles = self.guild_profiles.read().expect("guild profiles poisoned");
        profiles.get(slot as usize)?.as_ref().map(f)
    }

    pub fn with_guild_profile_mut<R>(
        &self,
        slot: u32,
        f: impl FnOnce(&mut GuildProfile) -> R,
    ) -> Option<R> {
        if slot == 0 {
            return None;
        }
        let mut profiles = self.guild_profiles.write().expect("guild profiles poisoned");
        profiles.get_mut(slot as usize)?.as_mut().map(f)
    }

    pub fn with_actor_profile<R>(&self, slot: u32, f: impl FnOnce(&ActorProfile) -> R) -> Option<R> {
        if slot == 0 {
            return None;
        }
        let profiles = self.actor_profiles.read().expect("actor profiles poisoned");
        profiles.get(slot as usize)?.as_ref().map(f)
    }

    pub fn with_actor_profile_mut<R>(
        &self,
        slot: u32,
        f: impl FnOnce(&mut ActorProfile) -> R,
    ) -> Option<R> {
        if slot == 0 {
            return None;
        }
        let mut profiles = self.actor_profiles.write().expect("actor profiles poisoned");
        profiles.get_mut(slot as usize)?.as_mut().map(f)
    }

    /// Clears counters and flags for one actor, e.g. on unban or clean
    /// rejoin. Mirrors spec §4.4's "clean slate on rejoin".
    pub fn clear_actor_state(&self, slot: u32) {
        if let Some(counters) = self.actor_counters(slot) {
            counters.reset();
        }
    }

    /// Records `new_bits` as the role's current permission bitmask and
    /// returns whatever was cached before it (0 if this role has never
    /// been seen). The permission detector XORs the two to find newly
    /// granted bits.
    pub fn permission_snapshot(&self, role_id: u64, new_bits: u64) -> u64 {
        let mut perms = self.role_perms.write().expect("role perms poisoned");
        perms.insert(role_id, new_bits).unwrap_or(0)
    }

    /// Locked hazard-tracking entry for a guild slot. The hazard table is
    /// sized smaller than the guild index (`MAX_HAZARD_ENTRIES` vs.
    /// `MAX_GUILDS`) to keep it cache-resident, so slots beyond its
    /// length wrap onto an existing entry rather than index out of
    /// bounds — a guild collision there costs detection precision, not
    /// correctness.
    pub fn hazard_entry(&self, guild_slot: u32) -> Option<&std::sync::Mutex<HazardEntry>> {
        if guild_slot == 0 {
            return None;
        }
        self.hazard.get(guild_slot as usize % hazard::MAX_HAZARD_ENTRIES)
    }

    /// Clears every actor counter belonging to a guild is out of scope
    /// for the hot path (spec §9 Open Question #2) — this runtime does
    /// not maintain a guild→actor reverse index, so a full-guild sweep
    /// is left as an explicit, operator-triggered action rather than an
    /// automatic background one.
    pub fn clear_guild_state(&self, slot: u32) {
        if let Some(counters) = self.guild_counters(slot) {
            counters.reset();
        }
    }
}

impl Default for PreallocatedState {
    fn default() -> Self {
        Self::new()
    }
}
