//! Property tests for the SPSC ring buffer's FIFO/capacity invariants
//! (spec §8: "Ring and queues are FIFO under single-producer/single-
//! consumer; capacity utilisation never exceeds `size - 1` elements.").

use proptest::prelude::*;
use sentinel_core::queue::ring::{OverflowPolicy, PushResult, Ring};

proptest! {
    #[test]
    fn drop_policy_is_fifo_and_never_exceeds_capacity(
        requested_capacity in 2usize..64,
        values in proptest::collection::vec(any::<u64>(), 0..500),
    ) {
        let ring: Ring<u64> = Ring::new(requested_capacity, OverflowPolicy::Drop);
        let usable = ring.capacity();

        let mut accepted = Vec::new();
        for v in &values {
            match ring.try_push(*v) {
                PushResult::Pushed => accepted.push(*v),
                PushResult::Dropped => {}
                PushResult::Overwritten => unreachable!("Drop policy never overwrites"),
            }
            prop_assert!(ring.len() <= usable);
        }

        let mut popped = Vec::new();
        while let Some(v) = ring.try_pop() {
            popped.push(v);
        }
        prop_assert_eq!(popped, accepted);
        prop_assert!(ring.is_empty());
    }

    #[test]
    fn overwrite_policy_keeps_the_newest_elements_in_order(
        requested_capacity in 2usize..32,
        values in proptest::collection::vec(any::<u64>(), 1..200),
    ) {
        let ring: Ring<u64> = Ring::new(requested_capacity, OverflowPolicy::Overwrite);
        let usable = ring.capacity() as usize;

        for v in &values {
            ring.try_push(*v);
            prop_assert!(ring.len() <= usable as u64);
        }

        let expected_len = values.len().min(usable);
        let expected: Vec<u64> = values[values.len() - expected_len..].to_vec();

        let mut popped = Vec::new();
        while let Some(v) = ring.try_pop() {
            popped.push(v);
        }
        prop_assert_eq!(popped, expected);
    }

    #[test]
    fn capacity_is_always_one_less_than_a_power_of_two(requested in 0usize..10_000) {
        let ring: Ring<u64> = Ring::new(requested, OverflowPolicy::Drop);
        let usable = ring.capacity();
        prop_assert!((usable + 1).is_power_of_two());
        prop_assert!(usable + 1 >= requested.max(2) as u64 || usable + 1 == 2);
    }
}
