//! Lock-free single-producer/single-consumer ring buffer.
//!
//! One ingest thread pushes, one correlator thread pops. Capacity is
//! rounded up to a power of two so index wrapping is a mask instead of a
//! modulo. `head`/`tail` and their single-writer cached peers sit on
//! separate cache lines (`CachePadded`) so the producer spinning on
//! `cached_tail` never bounces the consumer's `tail` cache line, and vice
//! versa — see `debasishg-ringmpsc-rs`'s `ring.rs` for the protocol this
//! is adapted from.
//!
//! Invariants:
//! - empty:  `head == tail`
//! - full:   `(head + 1) & mask == tail`
//! - capacity usable slots = `size - 1` (one slot always kept empty so
//!   empty/full are distinguishable without a separate counter)

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// What to do when the consumer can't keep up and the ring is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the incoming event, bump a metrics counter. Default — a hot
    /// path must never block on a slow consumer.
    #[default]
    Drop,
    /// Overwrite the oldest unread slot.
    Overwrite,
    /// Spin-wait for space. Only sane for low-rate producers (job queue).
    Block,
}

/// Outcome of a single `try_push`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    Pushed,
    Dropped,
    Overwritten,
}

pub struct Ring<T: Copy + Default> {
    buffer: UnsafeCell<Box<[MaybeUninit<T>]>>,
    mask: u64,
    policy: OverflowPolicy,

    head: CachePadded<AtomicU64>,
    cached_tail: CachePadded<UnsafeCell<u64>>,

    tail: CachePadded<AtomicU64>,
    cached_head: CachePadded<UnsafeCell<u64>>,

    dropped: AtomicU64,
    overwritten: AtomicU64,
}

// SAFETY: access to `buffer` is disciplined by the head/tail protocol —
// the producer only ever writes the slot at `head`, the consumer only
// ever reads the slot at `tail`, and they never touch the same slot
// concurrently (the full/empty invariants guarantee a gap of at least
// one element).
unsafe impl<T: Copy + Default> Sync for Ring<T> {}
unsafe impl<T: Copy + Default> Send for Ring<T> {}

impl<T: Copy + Default> Ring<T> {
    /// `capacity` is rounded up to the next power of two; the ring can
    /// hold `capacity - 1` elements at once.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let size = capacity.next_power_of_two().max(2);
        let mut buf = Vec::with_capacity(size);
        for _ in 0..size {
            buf.push(MaybeUninit::new(T::default()));
        }
        Ring {
            buffer: UnsafeCell::new(buf.into_boxed_slice()),
            mask: (size - 1) as u64,
            policy,
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            dropped: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.mask
    }

    fn slot(&self, index: u64) -> *mut MaybeUninit<T> {
        // SAFETY: `index & mask` is always within `buffer`'s bounds.
        unsafe { (*self.buffer.get()).as_mut_ptr().add((index & self.mask) as usize) }
    }

    /// Producer-only. Pushes one element, applying `self.policy` if full.
    pub fn try_push(&self, value: T) -> PushResult {
        let head = self.head.load(Ordering::Relaxed);
        // SAFETY: single producer, exclusive writer of cached_tail.
        let cached_tail = unsafe { *self.cached_tail.get() };

        let next = (head + 1) & self.mask;
        if next == cached_tail {
            let real_tail = self.tail.load(Ordering::Acquire);
            unsafe {
                *self.cached_tail.get() = real_tail;
            }
            if next == real_tail {
                return match self.policy {
                    OverflowPolicy::Drop => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        PushResult::Dropped
                    }
                    OverflowPolicy::Overwrite => {
                        // Advance tail past the slot we're about to clobber.
                        let new_tail = (real_tail + 1) & self.mask;
                        self.tail.store(new_tail, Ordering::Release);
                        unsafe {
                            *self.cached_tail.get() = new_tail;
                            self.slot(head).write(MaybeUninit::new(value));
                        }
                        self.head.store(next, Ordering::Release);
                        self.overwritten.fetch_add(1, Ordering::Relaxed);
                        PushResult::Overwritten
                    }
                    OverflowPolicy::Block => {
                        let mut backoff = 1u32;
                        loop {
                            let t = self.tail.load(Ordering::Acquire);
                            unsafe {
                                *self.cached_tail.get() = t;
                            }
                            if next != t {
                                break;
                            }
                            for _ in 0..backoff {
                                std::hint::spin_loop();
                            }
                            backoff = (backoff * 2).min(1024);
                        }
                        unsafe {
                            self.slot(head).write(MaybeUninit::new(value));
                        }
                        self.head.store(next, Ordering::Release);
                        PushResult::Pushed
                    }
                };
            }
        }

        unsafe {
            self.slot(head).write(MaybeUninit::new(value));
        }
        self.head.store(next, Ordering::Release);
        PushResult::Pushed
    }

    /// Consumer-only. Pops one element, or `None` if empty.
    pub fn try_pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        // SAFETY: single consumer, exclusive writer of cached_head.
        let cached_head = unsafe { *self.cached_head.get() };

        if tail == cached_head {
            let real_head = self.head.load(Ordering::Acquire);
            unsafe {
                *self.cached_head.get() = real_head;
            }
            if tail == real_head {
                return None;
            }
        }

        // SAFETY: slot at `tail` was written by the producer before it
        // advanced `head` past it, and Acquire on `head` above (or the
        // fast path's prior observation) synchronizes with that Release.
        let value = unsafe { self.slot(tail).assume_init_read() };
        self.tail.store((tail + 1) & self.mask, Ordering::Release);
        Some(value)
    }

    /// Drains up to `max` elements into `out`, returning the count popped.
    pub fn drain_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut n = 0;
        while n < max {
            match self.try_pop() {
                Some(v) => {
                    out.push(v);
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn overwritten_count(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> u64 {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head.wrapping_sub(tail)) & self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
