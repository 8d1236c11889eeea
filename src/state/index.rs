//! Dense index maps: platform snowflake IDs → small dense slot numbers.
//!
//! Guild/actor counters live in flat preallocated arrays so the hot path
//! never allocates or hashes; this is the one-time (per id) translation
//! from a 64-bit snowflake to a small array index. Slot 0 is reserved as
//! "not found" so lookups return `u32` with no `Option` wrapper needed
//! on the hot path.

use std::collections::HashMap;
use std::sync::RwLock;

pub struct DenseIndex {
    ids: RwLock<HashMap<u64, u32>>,
    next: std::sync::atomic::AtomicU32,
    capacity: u32,
    kind: &'static str,
}

impl DenseIndex {
    pub fn new(capacity: u32, kind: &'static str) -> Self {
        DenseIndex {
            ids: RwLock::new(HashMap::new()),
            next: std::sync::atomic::AtomicU32::new(1),
            capacity,
            kind,
        }
    }

    /// Returns the dense slot for `id`, assigning one if this is the
    /// first time it's been seen. Returns `0` if the table is full —
    /// callers treat that the same as a miss (spec §4.3: "a full index
    /// degrades to stateless pass-through, it never panics").
    pub fn get_or_insert(&self, id: u64) -> u32 {
        if let Some(&slot) = self.ids.read().expect("index rwlock poisoned").get(&id) {
            return slot;
        }
        let mut guard = self.ids.write().expect("index rwlock poisoned");
        if let Some(&slot) = guard.get(&id) {
            return slot;
        }
        use std::sync::atomic::Ordering;
        let slot = self.next.fetch_add(1, Ordering::Relaxed);
        if slot >= self.capacity {
            self.next.store(self.capacity, Ordering::Relaxed);
            log::warn!(target: "antinuke_audit", "{} index table full at {} slots", self.kind, self.capacity);
            return 0;
        }
        guard.insert(id, slot);
        slot
    }

    /// Looks up an existing slot without allocating a new one. `0` means
    /// "never seen" or "table was full when it was first seen".
    pub fn get(&self, id: u64) -> u32 {
        *self.ids.read().expect("index rwlock poisoned").get(&id).unwrap_or(&0)
    }

    pub fn len(&self) -> usize {
        self.ids.read().expect("index rwlock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_gets_slot_one() {
        let idx = DenseIndex::new(10, "test");
        assert_eq!(idx.get_or_insert(555), 1);
        assert_eq!(idx.get_or_insert(555), 1);
        assert_eq!(idx.get_or_insert(777), 2);
    }

    #[test]
    fn unknown_id_returns_zero() {
        let idx = DenseIndex::new(10, "test");
        assert_eq!(idx.get(999), 0);
    }

    #[test]
    fn overflow_degrades_to_zero_sentinel() {
        let idx = DenseIndex::new(2, "test");
        assert_eq!(idx.get_or_insert(1), 1);
        assert_eq!(idx.get_or_insert(2), 0);
        assert_eq!(idx.get_or_insert(3), 0);
    }
}
