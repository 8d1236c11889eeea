pub mod detectors;
pub mod guard;
pub mod panic;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::models::{AlertRecord, EventRecord, EventType};
use crate::queue::alert_queue::AlertQueue;
use crate::queue::ring::Ring;
use crate::state::PreallocatedState;

use detectors::{run_detectors, DetectorInputs};
use guard::ImmunityGuard;

pub struct Correlator {
    state: Arc<PreallocatedState>,
    alerts: Arc<AlertQueue>,
    metrics: Arc<crate::metrics::Metrics>,
    guard: ImmunityGuard,
    global_panic_mode: bool,
    critical_perm_mask: u64,
}

impl Correlator {
    pub fn new(
        state: Arc<PreallocatedState>,
        alerts: Arc<AlertQueue>,
        metrics: Arc<crate::metrics::Metrics>,
        owner_immune: bool,
        global_panic_mode: bool,
    ) -> Self {
        Correlator {
            state,
            alerts,
            metrics,
            guard: ImmunityGuard::new(owner_immune),
            global_panic_mode,
            critical_perm_mask: DEFAULT_CRITICAL_PERM_MASK,
        }
    }

    /// Runs the correlator's main loop, pinned to one thread, draining
    /// `ring` until `running` goes false. `Gosched`-style yield on an
    /// empty ring keeps CPU usage reasonable without adding latency
    /// under load (spec §4.2).
    pub fn run(
        &self,
        ring: &Ring<EventRecord>,
        running: &std::sync::atomic::AtomicBool,
        watchdog: &crate::watchdog::Watchdog,
    ) {
        let mut batch = Vec::with_capacity(256);
        while running.load(Ordering::Relaxed) {
            watchdog.heartbeat("correlator");
            batch.clear();
            let n = ring.drain_batch(&mut batch, 256);
            if n == 0 {
                std::thread::yield_now();
                continue;
            }
            for event in &batch {
                self.process_event(event);
            }
        }
    }

    pub fn process_event(&self, event: &EventRecord) {
        let guild_slot = self.state.register_guild(event.guild_id, 0);
        let actor_slot = self.state.register_actor(event.actor_id);
        if guild_slot == 0 || actor_slot == 0 {
            return;
        }

        let safe_to_act = self
            .state
            .with_actor_profile(actor_slot, |p| self.guard.is_safe_to_act_against(p))
            .unwrap_or(true);
        if !safe_to_act {
            return;
        }

        let Some(counters) = self.state.actor_counters(actor_slot) else { return };
        counters.record_action(event.timestamp_ns);
        self.bump_type_counter(guild_slot, actor_slot, event.kind());

        let panic_mode = self.global_panic_mode
            || self
                .state
                .with_guild_profile(guild_slot, |p| p.safety_mode == crate::state::guild::SafetyMode::Paranoid)
                .unwrap_or(false);

        if panic::should_fast_path_ban(panic_mode, event.kind()) {
            self.metrics.inc_panic_mode_trigger();
            let flag_bits = panic::fast_path_flag(event.kind());
            counters.set_triggered();
            counters.try_set_banned();
            self.emit_alert(event, guild_slot, actor_slot, flag_bits, true);
            return;
        }

        // RoleUpdate is not destructive on its own, but it's the only
        // event that carries a permission-bitmask change, so it still
        // needs to reach the permission detector.
        let permission_relevant = event.kind() == EventType::RoleUpdate;
        if !event.kind().is_destructive() && !permission_relevant {
            return;
        }

        if !panic_mode && counters.is_triggered() {
            // Already fired for this actor; stay quiet until cleared
            // (member join, unban, GuildCreate) per the sticky-bit
            // containment model.
            return;
        }

        let Some(guild_counters) = self.state.guild_counters(guild_slot) else { return };
        let thresholds = self
            .state
            .with_guild_profile(guild_slot, |p| p.effective_thresholds())
            .unwrap_or(crate::state::guild::thresholds_for(crate::state::guild::SizeClass::Medium));

        let (perm_before, perm_after) = if permission_relevant {
            (self.state.permission_snapshot(event.target_id, event.metadata), event.metadata)
        } else {
            (0, 0)
        };

        let velocity_current = guild_counters.velocity_score.fetch_add(1, Ordering::Relaxed) + 1;
        let velocity_last = guild_counters.last_velocity.swap(velocity_current, Ordering::Relaxed);

        let (hazard_score, distinct_actors) = self
            .state
            .hazard_entry(guild_slot)
            .map(|entry| {
                let mut entry = entry.lock().expect("hazard entry poisoned");
                let score = entry.record_and_score(event.guild_id, event.actor_id, velocity_current);
                (score, entry.actor_count)
            })
            .unwrap_or((0, 1));

        let inputs = DetectorInputs {
            ban_count: counters.ban_count.load(Ordering::Relaxed),
            kick_count: counters.kick_count.load(Ordering::Relaxed),
            chan_count: counters.channel_delete.load(Ordering::Relaxed),
            role_count: counters.role_delete.load(Ordering::Relaxed),
            web_count: counters.webhook_create.load(Ordering::Relaxed),
            perm_before,
            perm_after,
            critical_perm_mask: self.critical_perm_mask,
            velocity_current,
            velocity_last,
            distinct_actors,
            hazard_score,
            hazard_threshold: crate::state::hazard::DEFAULT_HAZARD_THRESHOLD,
        };
        let detector_flags = run_detectors(&inputs, &thresholds);

        if detector_flags.any() && counters.set_triggered() {
            self.emit_alert(event, guild_slot, actor_slot, detector_flags.0, false);
        }
    }

    fn bump_type_counter(&self, guild_slot: u32, actor_slot: u32, kind: EventType) {
        let guild = self.state.guild_counters(guild_slot);
        let actor = self.state.actor_counters(actor_slot);
        match kind {
            EventType::Ban => {
                guild.map(|g| g.ban_count.fetch_add(1, Ordering::Relaxed));
                actor.map(|a| a.ban_count.fetch_add(1, Ordering::Relaxed));
            }
            EventType::Kick => {
                guild.map(|g| g.kick_count.fetch_add(1, Ordering::Relaxed));
                actor.map(|a| a.kick_count.fetch_add(1, Ordering::Relaxed));
            }
            EventType::ChannelDelete => {
                guild.map(|g| g.channel_delete.fetch_add(1, Ordering::Relaxed));
                actor.map(|a| a.channel_delete.fetch_add(1, Ordering::Relaxed));
            }
            EventType::RoleDelete => {
                guild.map(|g| g.role_delete.fetch_add(1, Ordering::Relaxed));
                actor.map(|a| a.role_delete.fetch_add(1, Ordering::Relaxed));
            }
            EventType::WebhookCreate => {
                guild.map(|g| g.webhook_create.fetch_add(1, Ordering::Relaxed));
                actor.map(|a| a.webhook_create.fetch_add(1, Ordering::Relaxed));
            }
            EventType::MemberRemove => {
                guild.map(|g| g.member_remove.fetch_add(1, Ordering::Relaxed));
            }
            _ => {}
        }
    }

    fn emit_alert(&self, event: &EventRecord, guild_slot: u32, actor_slot: u32, flag_bits: u32, panic_mode: bool) {
        let severity_flags_count = (flag_bits.count_ones()) as u8;
        let alert = AlertRecord {
            guild_id: event.guild_id,
            actor_id: event.actor_id,
            target_id: event.target_id,
            event_type: event.event_type,
            severity: severity_flags_count,
            panic_mode: panic_mode as u8,
            flags: flag_bits,
            timestamp_ns: event.timestamp_ns,
        };
        let _ = (guild_slot, actor_slot);
        self.alerts.push(alert);
        self.metrics.inc_alerts_emitted();
    }
}

/// Discord-style permission bits covering administrative/destructive
/// grants (administrator, manage_guild, manage_roles, manage_channels,
/// ban_members, kick_members) — the bits a permission-escalation event
/// cares about, not the full permission bitfield.
pub const DEFAULT_CRITICAL_PERM_MASK: u64 = (1 << 3) | (1 << 5) | (1 << 4) | (1 << 28) | (1 << 2) | (1 << 1);
