//! Heuristics applied before an event is even handed to the correlator.
//!
//! Two patterns are cheap enough to check at ingest time rather than
//! waiting for the full detector pipeline:
//!
//! - **Fake events**: an attacker can fire gateway events for entities
//!   that don't actually exist (to waste moderation cycles or confuse
//!   logging). If the audit log's matching entry has no real target,
//!   the actor who submitted it is banned directly — there's no
//!   ambiguity left to correlate.
//! - **Unauthorized bot add**: a non-owner, non-whitelisted actor adding
//!   a bot integration is itself the abuse signal; it doesn't need to
//!   wait for the bot to act maliciously.

use crate::models::{EventRecord, EventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeEventVerdict {
    /// Not a fake event; proceed through the normal pipeline.
    Genuine,
    /// The named actor should be banned immediately; this event should
    /// not also be correlated normally (it would double-count).
    BanActor { actor_id: u64 },
}

/// `target_exists` is the caller's knowledge of whether `target_id`
/// actually resolves to something on the platform (looked up once per
/// audit match, not per correlator tick).
pub fn check_fake_event(event: &EventRecord, target_exists: bool, audit_actor: Option<u64>) -> FakeEventVerdict {
    if event.target_id != 0 && !target_exists {
        if let Some(actor_id) = audit_actor {
            return FakeEventVerdict::BanActor { actor_id };
        }
    }
    FakeEventVerdict::Genuine
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAddVerdict {
    Allowed,
    BanBotAndAdder { bot_id: u64, adder_id: u64 },
}

/// `adder_is_owner`/`adder_is_whitelisted` are looked up from the
/// actor's profile before calling this — kept as plain bools here so
/// the policy itself stays a pure function.
pub fn check_bot_add(
    event: &EventRecord,
    adder_is_owner: bool,
    adder_is_whitelisted: bool,
) -> BotAddVerdict {
    if event.kind() != EventType::IntegrationCreate {
        return BotAddVerdict::Allowed;
    }
    if adder_is_owner || adder_is_whitelisted {
        return BotAddVerdict::Allowed;
    }
    BotAddVerdict::BanBotAndAdder {
        bot_id: event.target_id,
        adder_id: event.actor_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(kind: EventType, target_id: u64, actor_id: u64) -> EventRecord {
        EventRecord {
            event_type: kind as u8,
            target_id,
            actor_id,
            ..Default::default()
        }
    }

    #[test]
    fn fake_event_with_nonexistent_target_bans_audit_actor() {
        let e = sample_event(EventType::ChannelDelete, 555, 1);
        let verdict = check_fake_event(&e, false, Some(42));
        assert_eq!(verdict, FakeEventVerdict::BanActor { actor_id: 42 });
    }

    #[test]
    fn genuine_target_passes_through() {
        let e = sample_event(EventType::ChannelDelete, 555, 1);
        let verdict = check_fake_event(&e, true, Some(42));
        assert_eq!(verdict, FakeEventVerdict::Genuine);
    }

    #[test]
    fn unresolved_audit_match_does_not_ban_blindly() {
        let e = sample_event(EventType::ChannelDelete, 555, 1);
        let verdict = check_fake_event(&e, false, None);
        assert_eq!(verdict, FakeEventVerdict::Genuine);
    }

    #[test]
    fn owner_adding_bot_is_allowed() {
        let e = sample_event(EventType::IntegrationCreate, 9, 1);
        assert_eq!(check_bot_add(&e, true, false), BotAddVerdict::Allowed);
    }

    #[test]
    fn non_owner_adding_bot_bans_both() {
        let e = sample_event(EventType::IntegrationCreate, 9, 1);
        assert_eq!(
            check_bot_add(&e, false, false),
            BotAddVerdict::BanBotAndAdder { bot_id: 9, adder_id: 1 }
        );
    }
}
