//! TTL cache mapping `(guild_id, action_code)` to the actor who performed
//! the matching audit-log entry.
//!
//! The platform's gateway fires a raw change event (e.g. "channel
//! deleted") before the audit-log entry naming who did it is available.
//! Ingest fetches the audit log shortly after and stashes the result
//! here so correlator lookups don't each trigger their own HTTP round
//! trip. Entries expire quickly — stale attribution is worse than none.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
struct Entry {
    actor_id: u64,
    inserted_at: Instant,
}

pub struct AuditCache {
    ttl: Duration,
    entries: Mutex<HashMap<(u64, u16), Entry>>,
}

impl AuditCache {
    pub fn new(ttl_ms: u64) -> Self {
        AuditCache {
            ttl: Duration::from_millis(ttl_ms),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, guild_id: u64, action_code: u16, actor_id: u64) {
        let mut guard = self.entries.lock().expect("audit cache poisoned");
        guard.insert(
            (guild_id, action_code),
            Entry {
                actor_id,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Looks up the actor for `(guild_id, action_code)`, evicting it if
    /// it's past the TTL.
    pub fn get(&self, guild_id: u64, action_code: u16) -> Option<u64> {
        let mut guard = self.entries.lock().expect("audit cache poisoned");
        let key = (guild_id, action_code);
        match guard.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.actor_id),
            Some(_) => {
                guard.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Drops every entry past the TTL. Called periodically rather than
    /// on every lookup miss so a quiet guild's cache doesn't grow
    /// unbounded between lookups.
    pub fn sweep(&self) {
        let mut guard = self.entries.lock().expect("audit cache poisoned");
        guard.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit cache poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_retrievable() {
        let cache = AuditCache::new(5_000);
        cache.insert(1, 12, 999);
        assert_eq!(cache.get(1, 12), Some(999));
    }

    #[test]
    fn expired_entry_evicts_on_lookup() {
        let cache = AuditCache::new(1);
        cache.insert(1, 12, 999);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(cache.get(1, 12), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn sweep_clears_only_expired() {
        let cache = AuditCache::new(1);
        cache.insert(1, 12, 999);
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.insert(2, 30, 111);
        cache.sweep();
        assert_eq!(cache.get(2, 30), Some(111));
        assert_eq!(cache.len(), 1);
    }
}
