//! Typed errors for conditions callers need to match on.
//!
//! Boundary code (ingest's audit-log fetch, the dispatcher's platform
//! calls) uses `anyhow::Result` with `.context(...)` instead — see
//! `ingest::fake_event` and `dispatcher::http_pool` for that idiom. This
//! module is for errors that flow back into decisions made in-process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("index capacity exceeded: {kind} table is full ({capacity} slots)")]
    IndexCapacityExceeded { kind: &'static str, capacity: usize },

    #[error("guild {0} is not known to this runtime")]
    GuildNotFound(u64),

    #[error("actor {0} is not known to this runtime")]
    ActorNotFound(u64),

    #[error("ring buffer full, overflow policy={policy:?}")]
    RingFull { policy: crate::queue::ring::OverflowPolicy },

    #[error("config file at {path} could not be parsed: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
