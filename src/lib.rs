pub mod affinity;
pub mod clock;
pub mod config;
pub mod correlator;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod forensics;
pub mod ha;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod platform;
pub mod queue;
pub mod runtime;
pub mod state;
pub mod watchdog;

pub use config::Config;
pub use error::SentinelError;
pub use metrics::Metrics;
pub use runtime::Runtime;
