//! Per-(route, guild) rate-limit bucket tracking.
//!
//! Parsed straight from the platform's `X-RateLimit-*` response headers.
//! Admission is optimistic: a route we've never seen, or one whose
//! reset time has passed, is always allowed through — we only hold back
//! once the platform has told us `remaining == 0`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitBucket {
    pub remaining: u32,
    pub limit: u32,
    pub reset_at_unix: u64,
}

pub struct RateLimitMonitor {
    buckets: RwLock<HashMap<String, RateLimitBucket>>,
}

impl RateLimitMonitor {
    pub fn new() -> Self {
        RateLimitMonitor { buckets: RwLock::new(HashMap::new()) }
    }

    fn key(route: &str, guild_id: u64) -> String {
        format!("{route}:{guild_id}")
    }

    pub fn can_execute(&self, route: &str, guild_id: u64) -> bool {
        let key = Self::key(route, guild_id);
        let buckets = self.buckets.read().expect("rate limit buckets poisoned");
        match buckets.get(&key) {
            None => true,
            Some(bucket) => {
                let now = now_unix();
                now > bucket.reset_at_unix || bucket.remaining > 0
            }
        }
    }

    pub fn update_from_headers(
        &self,
        route: &str,
        guild_id: u64,
        remaining: Option<u32>,
        limit: Option<u32>,
        reset_at_unix: Option<u64>,
    ) {
        let (Some(remaining), Some(limit), Some(reset_at_unix)) = (remaining, limit, reset_at_unix) else {
            return;
        };
        let key = Self::key(route, guild_id);
        let mut buckets = self.buckets.write().expect("rate limit buckets poisoned");
        buckets.insert(key, RateLimitBucket { remaining, limit, reset_at_unix });
    }
}

impl Default for RateLimitMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_route_is_always_admitted() {
        let monitor = RateLimitMonitor::new();
        assert!(monitor.can_execute("bans", 1));
    }

    #[test]
    fn exhausted_bucket_blocks_until_reset() {
        let monitor = RateLimitMonitor::new();
        monitor.update_from_headers("bans", 1, Some(0), Some(5), Some(now_unix() + 60));
        assert!(!monitor.can_execute("bans", 1));
    }

    #[test]
    fn bucket_past_reset_time_is_admitted_again() {
        let monitor = RateLimitMonitor::new();
        monitor.update_from_headers("bans", 1, Some(0), Some(5), Some(now_unix().saturating_sub(1)));
        assert!(monitor.can_execute("bans", 1));
    }

    #[test]
    fn remaining_capacity_admits() {
        let monitor = RateLimitMonitor::new();
        monitor.update_from_headers("bans", 1, Some(3), Some(5), Some(now_unix() + 60));
        assert!(monitor.can_execute("bans", 1));
    }
}
