use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::state::guild::SafetyMode;

const DEFAULT_CONFIG_PATH: &str = "/etc/antinuke/antinuke.toml";
const ENV_CONFIG_PATH: &str = "ANTINUKE_CONFIG";
const ENV_BOT_TOKEN: &str = "ANTINUKE_BOT_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
#[allow(dead_code)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub forensics: ForensicsConfig,
    #[serde(default)]
    pub ha: HaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Not part of the TOML file — populated from `ANTINUKE_BOT_TOKEN`
    /// after load, since a credential has no business living in a file
    /// on disk next to thresholds.
    #[serde(skip)]
    pub bot_token: String,
}

impl Config {
    /// Loads configuration from file. The path can be overridden with
    /// `ANTINUKE_CONFIG`. A missing or unparsable file falls back to
    /// defaults rather than failing startup — a misconfigured file
    /// should degrade to safe defaults, not take the whole guard down.
    pub fn load() -> Self {
        let path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = PathBuf::from(path);
        let mut cfg: Config = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Config::default(),
        };
        cfg.bot_token = std::env::var(ENV_BOT_TOKEN).unwrap_or_default();
        cfg
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_event_ring_capacity")]
    pub event_ring_capacity: usize,
    #[serde(default = "default_alert_ring_capacity")]
    pub alert_ring_capacity: usize,
    #[serde(default = "default_job_queue_capacity")]
    pub job_queue_capacity: usize,
    #[serde(default = "default_dispatcher_workers")]
    pub dispatcher_workers: usize,
    #[serde(default = "default_pin_threads")]
    pub pin_threads: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_ring_capacity: default_event_ring_capacity(),
            alert_ring_capacity: default_alert_ring_capacity(),
            job_queue_capacity: default_job_queue_capacity(),
            dispatcher_workers: default_dispatcher_workers(),
            pin_threads: default_pin_threads(),
        }
    }
}

fn default_event_ring_capacity() -> usize {
    65_536
}
fn default_alert_ring_capacity() -> usize {
    4_096
}
fn default_job_queue_capacity() -> usize {
    1_024
}
fn default_dispatcher_workers() -> usize {
    4
}
fn default_pin_threads() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_http_clients")]
    pub http_clients: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_warmup_probes")]
    pub warmup_probes: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            http_clients: default_http_clients(),
            request_timeout_ms: default_request_timeout_ms(),
            warmup_probes: default_warmup_probes(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}
fn default_http_clients() -> usize {
    8
}
fn default_request_timeout_ms() -> u64 {
    2_000
}
fn default_warmup_probes() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default = "default_safety_mode")]
    pub default_safety_mode: SafetyMode,
    #[serde(default = "default_panic_mode")]
    pub panic_mode: bool,
    #[serde(default = "default_velocity_window_ms")]
    pub velocity_window_ms: u64,
    #[serde(default = "default_owner_immune")]
    pub owner_immune: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            default_safety_mode: default_safety_mode(),
            panic_mode: default_panic_mode(),
            velocity_window_ms: default_velocity_window_ms(),
            owner_immune: default_owner_immune(),
        }
    }
}

fn default_safety_mode() -> SafetyMode {
    SafetyMode::Normal
}
fn default_panic_mode() -> bool {
    false
}
fn default_velocity_window_ms() -> u64 {
    10_000
}
fn default_owner_immune() -> bool {
    true
}

impl<'de> Deserialize<'de> for SafetyMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(SafetyMode::Normal),
            "elevated" => Ok(SafetyMode::Elevated),
            "high" => Ok(SafetyMode::High),
            "lockdown" => Ok(SafetyMode::Lockdown),
            "paranoid" => Ok(SafetyMode::Paranoid),
            other => Err(serde::de::Error::custom(format!(
                "unknown safety mode '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct ForensicsConfig {
    #[serde(default = "default_forensic_log_path")]
    pub log_path: String,
    #[serde(default = "default_audit_cache_ttl_ms")]
    pub audit_cache_ttl_ms: u64,
    #[serde(default = "default_audit_match_tolerance_ms")]
    pub audit_match_tolerance_ms: u64,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            log_path: default_forensic_log_path(),
            audit_cache_ttl_ms: default_audit_cache_ttl_ms(),
            audit_match_tolerance_ms: default_audit_match_tolerance_ms(),
        }
    }
}

fn default_forensic_log_path() -> String {
    "/var/log/antinuke/forensics.ndjson".to_string()
}
fn default_audit_cache_ttl_ms() -> u64 {
    7_000
}
fn default_audit_match_tolerance_ms() -> u64 {
    2_000
}

#[derive(Debug, Deserialize, Clone, Default)]
#[allow(dead_code)]
pub struct HaConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cluster_nodes")]
    pub cluster_nodes: Vec<String>,
}

fn default_cluster_nodes() -> Vec<String> {
    Vec::new()
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct LoggingConfig {
    #[serde(default = "default_audit_target")]
    pub audit_target: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            audit_target: default_audit_target(),
            json: false,
        }
    }
}

fn default_audit_target() -> String {
    "antinuke_audit".to_string()
}

/// Operator notification webhook. Left unset by default — sending a
/// "we just banned someone" embed to a channel nobody configured would
/// either silently fail or leak action details to the wrong place, so
/// notifications require an explicit opt-in URL.
#[derive(Debug, Deserialize, Clone, Default)]
#[allow(dead_code)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
}
