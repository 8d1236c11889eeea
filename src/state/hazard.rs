//! Multi-actor hazard scoring.
//!
//! A single compromised actor is caught by the per-actor threshold
//! detectors; a coordinated raid (many actors, each individually under
//! threshold) is not. The hazard score tracks that shape directly:
//! distinct actor count dominates, destructive-op count adds, and a
//! velocity spike past 10 events/window adds a smaller bump.

pub const MAX_HAZARD_ENTRIES: usize = 4096;

/// Flat default the multi-actor detector compares its score against,
/// independent of guild size class.
pub const DEFAULT_HAZARD_THRESHOLD: u64 = 50;

/// Destructive actions tracked per guild to estimate distinct-actor
/// cardinality; old entries age out once the ring wraps.
const RECENT_ACTORS_WINDOW: usize = 16;

pub fn calculate_hazard_score(distinct_actors: u64, destructive_ops: u64, velocity: u64) -> u64 {
    let mut score = 0u64;
    if distinct_actors > 1 {
        score += distinct_actors * 10;
    }
    score += destructive_ops * 5;
    if velocity > 10 {
        score += velocity * 2;
    }
    score
}

#[derive(Debug, Clone, Copy)]
pub struct HazardEntry {
    pub guild_id: u64,
    pub actor_count: u64,
    pub destructive_ops: u64,
    pub time_window_ns: i64,
    pub score: u64,
    recent_actors: [u64; RECENT_ACTORS_WINDOW],
    write_pos: usize,
    filled: usize,
}

impl Default for HazardEntry {
    fn default() -> Self {
        HazardEntry {
            guild_id: 0,
            actor_count: 0,
            destructive_ops: 0,
            time_window_ns: 0,
            score: 0,
            recent_actors: [0; RECENT_ACTORS_WINDOW],
            write_pos: 0,
            filled: 0,
        }
    }
}

impl HazardEntry {
    /// Records one destructive/permission-relevant action by `actor_id`
    /// and recomputes the guild's live hazard score. Distinct-actor count
    /// comes from a fixed-size ring of recent actor IDs rather than a set,
    /// so this never allocates on the correlator hot path; actors age out
    /// once the ring wraps past `RECENT_ACTORS_WINDOW` entries.
    pub fn record_and_score(&mut self, guild_id: u64, actor_id: u64, velocity: u64) -> u64 {
        self.guild_id = guild_id;
        self.destructive_ops += 1;
        self.recent_actors[self.write_pos] = actor_id;
        self.write_pos = (self.write_pos + 1) % RECENT_ACTORS_WINDOW;
        self.filled = (self.filled + 1).min(RECENT_ACTORS_WINDOW);

        let window = &self.recent_actors[..self.filled];
        let mut distinct = 0u64;
        for (i, id) in window.iter().enumerate() {
            if !window[..i].contains(id) {
                distinct += 1;
            }
        }
        self.actor_count = distinct;
        self.score = calculate_hazard_score(distinct, self.destructive_ops, velocity);
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_actor_gets_no_multi_actor_bonus() {
        assert_eq!(calculate_hazard_score(1, 2, 0), 10);
    }

    #[test]
    fn multi_actor_adds_per_actor_weight() {
        assert_eq!(calculate_hazard_score(3, 2, 0), 3 * 10 + 2 * 5);
    }

    #[test]
    fn velocity_bonus_only_applies_past_threshold() {
        assert_eq!(calculate_hazard_score(1, 0, 10), 0);
        assert_eq!(calculate_hazard_score(1, 0, 11), 22);
    }

    #[test]
    fn repeated_actor_never_counts_as_distinct() {
        let mut entry = HazardEntry::default();
        for _ in 0..5 {
            entry.record_and_score(1, 42, 0);
        }
        assert_eq!(entry.actor_count, 1);
    }

    #[test]
    fn distinct_actors_within_window_are_counted() {
        let mut entry = HazardEntry::default();
        entry.record_and_score(1, 1, 0);
        entry.record_and_score(1, 2, 0);
        let score = entry.record_and_score(1, 3, 0);
        assert_eq!(entry.actor_count, 3);
        assert_eq!(score, calculate_hazard_score(3, 3, 0));
    }

    #[test]
    fn actors_age_out_once_ring_wraps() {
        let mut entry = HazardEntry::default();
        for actor in 0..RECENT_ACTORS_WINDOW as u64 {
            entry.record_and_score(1, actor, 0);
        }
        assert_eq!(entry.actor_count, RECENT_ACTORS_WINDOW as u64);
        // One more distinct actor pushes out actor 0; count stays at the
        // window size rather than growing unbounded.
        entry.record_and_score(1, 9999, 0);
        assert_eq!(entry.actor_count, RECENT_ACTORS_WINDOW as u64);
    }
}
