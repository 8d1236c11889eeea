//! High-availability leader election.
//!
//! Specified as a pluggable interface: a deployment running a single
//! process never needs real consensus, so the default implementation
//! just always claims leadership. A clustered deployment would swap in
//! an implementation backed by actual inter-node voting — the trait is
//! the contract that lets the rest of the runtime stay agnostic to
//! which.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub trait LeaderElection: Send + Sync {
    fn is_leader(&self) -> bool;
    fn start_election(&self);
    fn term(&self) -> u64;
}

/// Single-process default: always leader, term never advances past 1.
pub struct SingleProcessLeader {
    leader: AtomicBool,
    term: AtomicU64,
}

impl SingleProcessLeader {
    pub fn new() -> Self {
        SingleProcessLeader {
            leader: AtomicBool::new(true),
            term: AtomicU64::new(1),
        }
    }
}

impl Default for SingleProcessLeader {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderElection for SingleProcessLeader {
    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::Relaxed)
    }

    fn start_election(&self) {
        // Nothing to do: a lone process always wins its own election.
        self.term.fetch_add(1, Ordering::Relaxed);
        self.leader.store(true, Ordering::Relaxed);
    }

    fn term(&self) -> u64 {
        self.term.load(Ordering::Relaxed)
    }
}

/// Majority-vote election over a fixed cluster node list. Votes are
/// supplied by the caller (e.g. gathered over a gossip/RPC layer that
/// lives outside this crate) — this type only implements the counting
/// and term-bookkeeping contract, since real networked consensus is out
/// of scope beyond its interface.
pub struct ClusterLeader {
    cluster_size: usize,
    leader: AtomicBool,
    term: AtomicU64,
}

impl ClusterLeader {
    pub fn new(cluster_size: usize) -> Self {
        ClusterLeader {
            cluster_size: cluster_size.max(1),
            leader: AtomicBool::new(false),
            term: AtomicU64::new(0),
        }
    }

    /// Records the result of an election round given `votes` received
    /// for this node in the new term.
    pub fn record_votes(&self, votes: usize) {
        self.term.fetch_add(1, Ordering::Relaxed);
        self.leader.store(votes * 2 > self.cluster_size, Ordering::Relaxed);
    }
}

impl LeaderElection for ClusterLeader {
    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::Relaxed)
    }

    fn start_election(&self) {
        // Vote for self; real implementations solicit votes from peers
        // before calling `record_votes`.
        self.record_votes(1);
    }

    fn term(&self) -> u64 {
        self.term.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_process_is_always_leader() {
        let e = SingleProcessLeader::new();
        assert!(e.is_leader());
        e.start_election();
        assert!(e.is_leader());
        assert_eq!(e.term(), 2);
    }

    #[test]
    fn cluster_leader_requires_majority() {
        let e = ClusterLeader::new(5);
        e.record_votes(2);
        assert!(!e.is_leader());
        e.record_votes(3);
        assert!(e.is_leader());
    }
}
