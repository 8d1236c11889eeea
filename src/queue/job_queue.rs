//! Decision engine → dispatcher worker pool hand-off.
//!
//! Single producer (the decision engine), multiple consumers (the
//! dispatcher's worker threads). [`Ring`] assumes one consumer, so
//! instead of reusing it directly this wraps a `Mutex<VecDeque>` —
//! job volume is alert-rate, orders of magnitude below the event-ring's
//! per-event rate, so a lock here costs nothing the hot path would
//! notice. Workers CAS a shared epoch counter purely for metrics
//! (`claims`), not for correctness — the mutex already serializes pops.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::JobRecord;

pub struct JobQueue {
    inner: Mutex<VecDeque<JobRecord>>,
    claims: AtomicU64,
    capacity: usize,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        JobQueue {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            claims: AtomicU64::new(0),
            capacity,
        }
    }

    /// Pushes a job. Jobs are never dropped — panic-mode and ban jobs
    /// are the highest-value output of the whole pipeline.
    pub fn push(&self, job: JobRecord) {
        let mut guard = self.inner.lock().expect("job queue mutex poisoned");
        if guard.len() >= self.capacity {
            log::warn!(target: "antinuke_audit", "job queue at capacity {}, growing past configured bound", self.capacity);
        }
        guard.push_back(job);
    }

    /// Called by any dispatcher worker to claim the next job.
    pub fn pop(&self) -> Option<JobRecord> {
        let mut guard = self.inner.lock().expect("job queue mutex poisoned");
        let job = guard.pop_front();
        if job.is_some() {
            self.claims.fetch_add(1, Ordering::Relaxed);
        }
        job
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("job queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_claims(&self) -> u64 {
        self.claims.load(Ordering::Relaxed)
    }
}
