//! Top-level wiring: owns every shared piece of state and spawns the
//! pipeline's threads in order. Replaces the pattern of scattered
//! global singletons with one struct the rest of the crate borrows
//! from, constructed once at startup and torn down in the reverse of
//! its construction order.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::affinity::{Affinity, DefaultAffinity};
use crate::config::Config;
use crate::correlator::Correlator;
use crate::decision::DecisionEngine;
use crate::dispatcher::http_pool::HttpPool;
use crate::dispatcher::Dispatcher;
use crate::forensics::ForensicLogger;
use crate::ha::{ClusterLeader, LeaderElection, SingleProcessLeader};
use crate::ingest::audit_cache::AuditCache;
use crate::ingest::AuditLogFetcher;
use crate::metrics::Metrics;
use crate::models::EventRecord;
use crate::notify::discord::DiscordNotifier;
use crate::platform::{PlatformClient, RestPlatformClient};
use crate::queue::alert_queue::AlertQueue;
use crate::queue::job_queue::JobQueue;
use crate::queue::ring::{OverflowPolicy, Ring};
use crate::state::PreallocatedState;
use crate::watchdog::Watchdog;

pub struct Runtime {
    pub config: Config,
    pub metrics: Arc<Metrics>,
    pub state: Arc<PreallocatedState>,
    pub event_ring: Arc<Ring<EventRecord>>,
    pub alerts: Arc<AlertQueue>,
    pub jobs: Arc<JobQueue>,
    pub audit_cache: Arc<AuditCache>,
    pub audit_fetcher: Arc<AuditLogFetcher>,
    pub watchdog: Arc<Watchdog>,
    pub leader: Arc<dyn LeaderElection>,
    pub platform: Arc<dyn PlatformClient>,
    pub notifier: Option<Arc<DiscordNotifier>>,
    running: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let state = Arc::new(PreallocatedState::new());
        let event_ring = Arc::new(Ring::new(config.runtime.event_ring_capacity, OverflowPolicy::Drop));
        let alerts = Arc::new(AlertQueue::new(config.runtime.alert_ring_capacity));
        let jobs = Arc::new(JobQueue::new(config.runtime.job_queue_capacity));
        let audit_cache = Arc::new(AuditCache::new(config.forensics.audit_cache_ttl_ms));

        let audit_fetcher = Arc::new(AuditLogFetcher::new(
            config.network.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_millis(config.network.request_timeout_ms),
        )?);

        let pool = HttpPool::new(
            config.network.http_clients,
            Duration::from_millis(config.network.request_timeout_ms),
        )?;
        pool.warmup(&config.network.api_base_url, config.network.warmup_probes);
        let platform: Arc<dyn PlatformClient> = Arc::new(RestPlatformClient::new(
            pool,
            config.network.api_base_url.clone(),
            config.bot_token.clone(),
        ));

        let notifier = config
            .notify
            .webhook_url
            .clone()
            .map(|url| Arc::new(DiscordNotifier::new(url)));

        let leader: Arc<dyn LeaderElection> = if config.ha.enabled {
            Arc::new(ClusterLeader::new(config.ha.cluster_nodes.len().max(1)))
        } else {
            Arc::new(SingleProcessLeader::new())
        };

        let watchdog = Arc::new(Watchdog::new());
        for stage in ["ingest", "correlator", "decision", "dispatcher"] {
            watchdog.register(stage, Duration::from_secs(10));
        }

        Ok(Runtime {
            config,
            metrics,
            state,
            event_ring,
            alerts,
            jobs,
            audit_cache,
            audit_fetcher,
            watchdog,
            leader,
            platform,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Spawns correlator, decision, and dispatcher-worker threads and
    /// returns their join handles. Ingest is driven by the platform's
    /// gateway connection, which is owned by the caller (`main`) since
    /// it needs to run the async event loop that feeds `event_ring`.
    pub fn start(&self) -> anyhow::Result<Vec<std::thread::JoinHandle<()>>> {
        self.running.store(true, std::sync::atomic::Ordering::Relaxed);
        let mut handles = Vec::new();

        let forensics = match ForensicLogger::open(&self.config.forensics.log_path) {
            Ok(logger) => Some(Arc::new(logger)),
            Err(err) => {
                log::warn!(target: "antinuke_audit", "forensic logging disabled: {err:#}");
                None
            }
        };

        let correlator = Arc::new(Correlator::new(
            self.state.clone(),
            self.alerts.clone(),
            self.metrics.clone(),
            self.config.detection.owner_immune,
            self.config.detection.panic_mode,
        ));
        let ring = self.event_ring.clone();
        let running = self.running.clone();
        let watchdog = self.watchdog.clone();
        let pin = self.config.runtime.pin_threads;
        handles.push(std::thread::spawn(move || {
            if pin {
                DefaultAffinity::pin_current(1);
            }
            correlator.run(&ring, &running, &watchdog);
        }));

        let decision = Arc::new(DecisionEngine::new(
            self.state.clone(),
            self.alerts.clone(),
            self.jobs.clone(),
            forensics,
            self.metrics.clone(),
        ));
        let running2 = self.running.clone();
        let watchdog2 = self.watchdog.clone();
        handles.push(std::thread::spawn(move || {
            if pin {
                DefaultAffinity::pin_current(2);
            }
            decision.run(&running2, &watchdog2);
        }));

        let dispatcher = Arc::new(Dispatcher::new(
            self.jobs.clone(),
            self.platform.clone(),
            self.notifier.clone(),
            self.metrics.clone(),
        ));
        handles.extend(dispatcher.spawn_workers(
            self.config.runtime.dispatcher_workers,
            self.running.clone(),
            self.watchdog.clone(),
        ));

        Ok(handles)
    }

    /// Signals every spawned thread to stop. Threads check `running` at
    /// the top of each loop iteration, so shutdown is not instantaneous
    /// — callers should `join()` the handles `start()` returned after
    /// calling this.
    pub fn shutdown(&self) {
        self.running.store(false, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::Relaxed)
    }
}
