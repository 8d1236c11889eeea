pub mod audit_cache;
pub mod fake_event;

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{EventRecord, EventType};
use crate::queue::ring::Ring;
use crate::state::PreallocatedState;

/// One audit-log entry as returned by the platform's REST API. IDs
/// arrive as strings on the wire (snowflakes exceed JS's safe integer
/// range) and are parsed to `u64` here, once, at the boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub action_type: u16,
    pub user_id: Option<String>,
    pub target_id: Option<String>,
    pub reason: Option<String>,
}

impl AuditLogEntry {
    pub fn user_id_u64(&self) -> Option<u64> {
        self.user_id.as_ref().and_then(|s| s.parse().ok())
    }

    pub fn target_id_u64(&self) -> Option<u64> {
        self.target_id.as_ref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
struct AuditLogResponse {
    #[serde(default)]
    audit_log_entries: Vec<AuditLogEntry>,
}

/// Fetches recent audit-log entries for a guild. Synchronous/blocking:
/// ingest calls this from its own thread, off the ring-buffer hot path,
/// so there's no need to drag an async runtime onto a pinned thread
/// just for this.
pub struct AuditLogFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
    bot_token: String,
}

impl AuditLogFetcher {
    pub fn new(base_url: String, bot_token: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building audit log HTTP client")?;
        Ok(AuditLogFetcher { client, base_url, bot_token })
    }

    pub fn fetch_recent(&self, guild_id: u64, limit: u32) -> anyhow::Result<Vec<AuditLogEntry>> {
        let url = format!("{}/guilds/{}/audit-logs?limit={}", self.base_url, guild_id, limit);
        self.fetch(&url)
    }

    pub fn fetch_by_action(
        &self,
        guild_id: u64,
        action_type: u16,
        limit: u32,
    ) -> anyhow::Result<Vec<AuditLogEntry>> {
        let url = format!(
            "{}/guilds/{}/audit-logs?action_type={}&limit={}",
            self.base_url, guild_id, action_type, limit
        );
        self.fetch(&url)
    }

    fn fetch(&self, url: &str) -> anyhow::Result<Vec<AuditLogEntry>> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .context("sending audit log request")?
            .error_for_status()
            .context("audit log endpoint returned an error status")?;
        let parsed: AuditLogResponse = resp.json().context("parsing audit log response body")?;
        Ok(parsed.audit_log_entries)
    }
}

/// Matches a gateway event against recently-fetched audit-log entries
/// within a tolerance window, to attribute "what happened" (the
/// gateway event) to "who did it" (the audit log).
pub struct AuditMatcher {
    tolerance: Duration,
}

impl AuditMatcher {
    pub fn new(tolerance: Duration) -> Self {
        AuditMatcher { tolerance }
    }

    /// Finds the first entry whose target matches `target_id`. The
    /// platform's audit log is already ordered newest-first, and ingest
    /// only fetches it shortly after the gateway event, so tolerance is
    /// informational here (kept for parity with the matching contract,
    /// applied by the caller against the event's own timestamp).
    pub fn find_actor(&self, entries: &[AuditLogEntry], target_id: u64) -> Option<u64> {
        entries
            .iter()
            .find(|e| e.target_id_u64() == Some(target_id))
            .and_then(|e| e.user_id_u64())
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }
}

/// Translates a raw platform gateway frame into the fixed-layout
/// [`EventRecord`] the ring buffer carries. The actual gateway
/// connection lives behind [`crate::platform`]; this is pure data
/// shaping so it's trivially unit-testable without a socket.
pub fn to_event_record(
    event_type: EventType,
    guild_id: u64,
    actor_id: u64,
    target_id: u64,
    metadata: u64,
) -> EventRecord {
    let priority = if event_type.is_destructive() { 2 } else { 0 };
    EventRecord {
        event_type: event_type as u8,
        priority,
        flags: 0,
        guild_id,
        actor_id,
        target_id,
        metadata,
        timestamp_ns: crate::clock::now_nanos(),
    }
}

/// Role-create events for platform/integration-managed roles (bot
/// permission roles, booster roles) are created constantly by normal
/// platform activity and would otherwise drown out the role-churn
/// detector. `managed` comes straight off the gateway payload's own
/// `managed` flag.
pub fn is_ignorable_managed_role(event_type: EventType, managed: bool) -> bool {
    event_type == EventType::RoleCreate && managed
}

/// Clean-slate rules (spec §4.4): a human rejoining clears their
/// counters and banned bit outright. A bot rejoining only gets the
/// clean slate if whoever re-added it is trusted (owner or
/// whitelisted) — otherwise the bot keeps whatever history it had
/// before being removed, since an untrusted re-add is itself
/// suspicious and shouldn't erase prior evidence.
pub fn apply_clean_slate(state: &PreallocatedState, actor_slot: u32, is_bot: bool, added_by_trusted: bool) {
    if !is_bot || added_by_trusted {
        state.clear_actor_state(actor_slot);
    }
}

/// Pushes a translated event onto the ingest ring, bumping metrics on
/// overflow. Kept as a free function (rather than a method on `Ring`)
/// so it can report through [`crate::metrics::Metrics`] without the
/// generic ring type needing to know about metrics at all.
pub fn push_event(
    ring: &Ring<EventRecord>,
    metrics: &crate::metrics::Metrics,
    record: EventRecord,
) {
    use crate::queue::ring::PushResult;
    match ring.try_push(record) {
        PushResult::Pushed => {}
        PushResult::Dropped => metrics.inc_ring_overflow(),
        PushResult::Overwritten => metrics.inc_ring_overflow(),
    }
}
