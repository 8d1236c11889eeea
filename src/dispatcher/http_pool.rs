//! Warmed, round-robin pool of blocking HTTP clients.
//!
//! Dispatcher workers are pinned OS threads issuing synchronous
//! requests — no async runtime on this path, matching the pinned
//! single-purpose thread model the rest of the pipeline uses. Each
//! client gets short timeouts and no automatic retry: a stuck request
//! should fail fast and let the worker move to the next job rather than
//! block the pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;

pub struct HttpPool {
    clients: Vec<reqwest::blocking::Client>,
    next: AtomicUsize,
}

impl HttpPool {
    pub fn new(size: usize, request_timeout: Duration) -> anyhow::Result<Self> {
        let mut clients = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let client = reqwest::blocking::Client::builder()
                .timeout(request_timeout)
                .pool_max_idle_per_host(4)
                .build()
                .context("building dispatcher HTTP client")?;
            clients.push(client);
        }
        Ok(HttpPool { clients, next: AtomicUsize::new(0) })
    }

    pub fn get(&self) -> &reqwest::blocking::Client {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[idx]
    }

    /// Pings the platform's gateway endpoint up to `attempts` times,
    /// logging a warning (not an error) if fewer than two succeed —
    /// the pool still works, it just starts cold instead of warm.
    pub fn warmup(&self, base_url: &str, attempts: u32) {
        let mut successes = 0;
        for _ in 0..attempts {
            let url = format!("{base_url}/gateway");
            if self.get().get(&url).send().is_ok() {
                successes += 1;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        if successes < 2 {
            log::warn!(target: "antinuke_audit", "HTTP pool warmup saw only {successes}/{attempts} successes");
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_round_robins_clients() {
        let pool = HttpPool::new(3, Duration::from_millis(500)).unwrap();
        assert_eq!(pool.len(), 3);
        // Just confirm get() doesn't panic across several calls.
        for _ in 0..10 {
            let _ = pool.get();
        }
    }
}
