//! Operator-facing log-channel notifications.
//!
//! Fired after a job completes, carrying detection/action timing in
//! microseconds so operators can see how fast the pipeline reacted.
//! Posting is fire-and-forget: a failed webhook post must never hold up
//! a dispatcher worker, so errors are logged and swallowed here.

use serde::Serialize;

use crate::models::{JobRecord, JobType};

#[derive(Debug, Serialize)]
struct DiscordWebhookMessage {
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    color: u32,
    fields: Vec<DiscordField>,
    footer: DiscordFooter,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

const EMBED_COLOR_ACTION_TAKEN: u32 = 0xED4245;

pub struct DiscordNotifier {
    webhook_url: String,
    client: reqwest::blocking::Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        DiscordNotifier {
            webhook_url,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Builds and posts the embed for a completed job. `ban_ns` is the
    /// elapsed time from detection to action completion.
    pub fn notify_action(&self, job: &JobRecord, ban_ns: i64) {
        let emoji = match job.job_type {
            JobType::Ban => "🔨",
            JobType::Kick => "👢",
            JobType::Quarantine => "🔒",
            JobType::Lockdown => "🚨",
            JobType::RoleRemove => "🛡️",
        };
        let action_name = match job.job_type {
            JobType::Ban => "Ban",
            JobType::Kick => "Kick",
            JobType::Quarantine => "Quarantine",
            JobType::Lockdown => "Lockdown",
            JobType::RoleRemove => "Role Removed",
        };

        let ban_field_value = format_duration_field(ban_ns);
        let embed = DiscordEmbed {
            title: format!("{emoji} {action_name} — Anti-Nuke Action Taken"),
            color: EMBED_COLOR_ACTION_TAKEN,
            fields: vec![
                DiscordField {
                    name: "👤 Actor".to_string(),
                    value: format!("<@{}>", job.target_id),
                    inline: true,
                },
                DiscordField {
                    name: "⚡ Detection Speed".to_string(),
                    value: format!("**{} µs**", ban_ns / 1_000),
                    inline: true,
                },
                DiscordField {
                    name: format!("{emoji} {action_name} Execution"),
                    value: ban_field_value,
                    inline: true,
                },
                DiscordField {
                    name: "📝 Reason".to_string(),
                    value: job.reason.clone(),
                    inline: false,
                },
            ],
            footer: DiscordFooter {
                text: "Ultra-Low-Latency Anti-Nuke System".to_string(),
            },
        };

        let message = DiscordWebhookMessage { embeds: vec![embed] };
        if let Err(err) = self.client.post(&self.webhook_url).json(&message).send() {
            log::warn!(target: "antinuke_audit", "failed to post operator notification: {err:#}");
        }
    }
}

fn format_duration_field(ns: i64) -> String {
    if ns < 100_000_000 {
        format!("**{} µs**", ns / 1_000)
    } else {
        format!("**{} ms**", ns / 1_000_000)
    }
}
