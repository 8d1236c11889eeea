//! Correlator → decision engine hand-off.
//!
//! One correlator thread, one decision-engine thread: a plain SPSC
//! [`Ring`] fits directly, no generalization needed beyond picking a
//! block-on-full policy — an alert must never be silently dropped, so
//! if the decision engine stalls the correlator backs off rather than
//! losing the alert (spec §4.2: "alerts are never dropped").

use crate::models::AlertRecord;
use crate::queue::ring::{OverflowPolicy, Ring};

pub struct AlertQueue {
    ring: Ring<AlertRecord>,
}

impl AlertQueue {
    pub fn new(capacity: usize) -> Self {
        AlertQueue {
            ring: Ring::new(capacity, OverflowPolicy::Block),
        }
    }

    pub fn push(&self, alert: AlertRecord) {
        self.ring.try_push(alert);
    }

    pub fn pop(&self) -> Option<AlertRecord> {
        self.ring.try_pop()
    }

    pub fn len(&self) -> u64 {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_survive_push_pop_roundtrip() {
        let q = AlertQueue::new(16);
        let a = AlertRecord {
            guild_id: 42,
            ..Default::default()
        };
        q.push(a);
        let popped = q.pop().unwrap();
        assert_eq!(popped.guild_id, 42);
        assert!(q.is_empty());
    }
}
