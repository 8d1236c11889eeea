//! Ingest-time heuristics and rate-limit admission, scenarios 4-6 of
//! spec.md §8. These bypass the correlator entirely — fake events and
//! unauthorized bot adds are acted on directly at the ingest boundary.

use std::sync::Mutex;

use sentinel_core::dispatcher::rate_limit::RateLimitMonitor;
use sentinel_core::ingest::fake_event::{check_bot_add, check_fake_event, BotAddVerdict, FakeEventVerdict};
use sentinel_core::models::{EventRecord, EventType};
use sentinel_core::platform::PlatformClient;

struct RecordingPlatform {
    calls: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    fn new() -> Self {
        RecordingPlatform { calls: Mutex::new(Vec::new()) }
    }
}

impl PlatformClient for RecordingPlatform {
    fn ban_member(&self, guild_id: u64, user_id: u64, reason: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("ban:{guild_id}:{user_id}:{reason}"));
        Ok(())
    }
    fn kick_member(&self, _guild_id: u64, _user_id: u64, _reason: &str) -> anyhow::Result<()> {
        Ok(())
    }
    fn remove_role(&self, _guild_id: u64, _user_id: u64, _role_id: u64, _reason: &str) -> anyhow::Result<()> {
        Ok(())
    }
    fn lockdown_guild(&self, _guild_id: u64, _reason: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Scenario 4: fake channel delete. The audit entry's target doesn't
/// exist on the platform, so the audit entry's own actor is banned
/// directly — no correlator involvement.
#[test]
fn scenario_fake_channel_delete_bans_audit_actor() {
    let guild_id = 7u64;
    let event = EventRecord {
        event_type: EventType::ChannelDelete as u8,
        guild_id,
        actor_id: 0, // the gateway event itself carries no reliable actor
        target_id: 555,
        ..Default::default()
    };

    let verdict = check_fake_event(&event, false, Some(42));
    let FakeEventVerdict::BanActor { actor_id } = verdict else {
        panic!("expected a fake-event ban verdict, got {verdict:?}");
    };

    let platform = RecordingPlatform::new();
    platform
        .ban_member(guild_id, actor_id, "Fake channel delete event: audit target does not exist")
        .unwrap();

    let calls = platform.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("ban:7:42"));
    assert!(calls[0].contains("Fake channel delete event"));
}

/// Scenario 5: unauthorized bot add. Both the bot and the adder are
/// banned when the adder is neither owner nor whitelisted.
#[test]
fn scenario_unauthorized_bot_add_bans_both_accounts() {
    let guild_id = 7u64;
    let event = EventRecord {
        event_type: EventType::IntegrationCreate as u8,
        guild_id,
        actor_id: 100, // the adder
        target_id: 900, // the bot
        ..Default::default()
    };

    let verdict = check_bot_add(&event, false, false);
    let BotAddVerdict::BanBotAndAdder { bot_id, adder_id } = verdict else {
        panic!("expected both accounts to be banned, got {verdict:?}");
    };

    let platform = RecordingPlatform::new();
    platform.ban_member(guild_id, bot_id, "Unauthorized bot add").unwrap();
    platform.ban_member(guild_id, adder_id, "Unauthorized bot add").unwrap();

    let calls = platform.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().any(|c| c.contains("ban:7:900")));
    assert!(calls.iter().any(|c| c.contains("ban:7:100")));
}

/// Scenario 5 (negative case): owner-added bots pass through untouched.
#[test]
fn scenario_owner_added_bot_is_allowed() {
    let event = EventRecord {
        event_type: EventType::IntegrationCreate as u8,
        guild_id: 7,
        actor_id: 1,
        target_id: 900,
        ..Default::default()
    };
    assert_eq!(check_bot_add(&event, true, false), BotAddVerdict::Allowed);
}

/// Scenario 6: rate-limit backoff. Two bans in rapid succession; the
/// first response exhausts the bucket, the second call is refused until
/// the reset passes, after which it's admissible again.
#[test]
fn scenario_rate_limit_backoff_then_recovery() {
    let monitor = RateLimitMonitor::new();
    let guild_id = 7u64;

    assert!(monitor.can_execute("bans", guild_id), "first call has no bucket yet, must be admitted");

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    monitor.update_from_headers("bans", guild_id, Some(0), Some(1), Some(now + 1));

    assert!(!monitor.can_execute("bans", guild_id), "bucket exhausted, second call must be refused");

    // Simulate the reset passing.
    monitor.update_from_headers("bans", guild_id, Some(0), Some(1), Some(now.saturating_sub(1)));
    assert!(monitor.can_execute("bans", guild_id), "bucket admissible again once its reset time has passed");
}
