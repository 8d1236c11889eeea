//! Append-only forensic audit trail.
//!
//! Every decision the engine makes — not just the ones that result in
//! an action — is written here as a line of JSON. This is distinct from
//! the regular `log` output: it's structured, append-only, and meant to
//! be replayed or queried after an incident, not tailed by a human.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ForensicEntry {
    pub timestamp_ns: i64,
    pub event_type: String,
    pub guild_id: u64,
    pub actor_id: u64,
    pub target_id: u64,
    pub severity: u64,
    pub data: Value,
}

impl ForensicEntry {
    /// Wall-clock timestamp the logger stamps onto each line as it's
    /// written. `timestamp_ns` is the monotonic detection time used for
    /// latency math; this one is for a human reading the file.
    fn stamped_at() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[derive(Serialize)]
struct StampedEntry<'a> {
    #[serde(flatten)]
    entry: &'a ForensicEntry,
    logged_at: String,
}

pub struct ForensicLogger {
    file: Mutex<File>,
    path: String,
}

impl ForensicLogger {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening forensic log at {path}"))?;
        Ok(ForensicLogger {
            file: Mutex::new(file),
            path: path.to_string(),
        })
    }

    pub fn append(&self, entry: &ForensicEntry) -> anyhow::Result<()> {
        let stamped = StampedEntry { entry, logged_at: ForensicEntry::stamped_at() };
        let mut line = serde_json::to_string(&stamped).context("serializing forensic entry")?;
        line.push('\n');
        let mut file = self.file.lock().expect("forensic log file mutex poisoned");
        file.write_all(line.as_bytes())
            .with_context(|| format!("appending to forensic log at {}", self.path))?;
        Ok(())
    }
}
