//! Per-stage heartbeat monitor.
//!
//! Ingest, correlator, decision, and each dispatcher worker call
//! [`Watchdog::heartbeat`] once per loop iteration. A background check
//! loop marks a stage unhealthy once its heartbeat goes stale past its
//! configured threshold, feeding [`crate::metrics::Metrics`] so an
//! operator dashboard (or alerting on the metrics themselves) notices a
//! stalled pipeline stage before it silently stops processing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct ComponentHealth {
    last_heartbeat: Instant,
    healthy: bool,
    threshold: Duration,
}

pub struct Watchdog {
    components: RwLock<HashMap<String, ComponentHealth>>,
    alert_threshold_misses: u32,
}

impl Watchdog {
    pub fn new() -> Self {
        Watchdog {
            components: RwLock::new(HashMap::new()),
            alert_threshold_misses: 3,
        }
    }

    pub fn register(&self, name: &str, threshold: Duration) {
        let mut guard = self.components.write().expect("watchdog components poisoned");
        guard.insert(
            name.to_string(),
            ComponentHealth { last_heartbeat: Instant::now(), healthy: true, threshold },
        );
    }

    pub fn heartbeat(&self, name: &str) {
        let mut guard = self.components.write().expect("watchdog components poisoned");
        if let Some(health) = guard.get_mut(name) {
            health.last_heartbeat = Instant::now();
            health.healthy = true;
        }
    }

    /// Sweeps every registered component, marking any past its
    /// threshold as unhealthy. Returns the names currently unhealthy.
    pub fn check(&self) -> Vec<String> {
        let mut guard = self.components.write().expect("watchdog components poisoned");
        let mut unhealthy = Vec::new();
        for (name, health) in guard.iter_mut() {
            if health.last_heartbeat.elapsed() > health.threshold {
                health.healthy = false;
            }
            if !health.healthy {
                unhealthy.push(name.clone());
            }
        }
        unhealthy
    }

    pub fn is_healthy(&self, name: &str) -> bool {
        self.components
            .read()
            .expect("watchdog components poisoned")
            .get(name)
            .map(|h| h.healthy)
            .unwrap_or(false)
    }

    pub fn alert_threshold_misses(&self) -> u32 {
        self.alert_threshold_misses
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
