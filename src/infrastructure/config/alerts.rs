//! Alert delivery and kill switch configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::port::outbound::notifier::AlertLevel;

/// Webhook alerts. Disabled while `webhook_url` is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Minimum seconds between webhook posts.
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
    /// Events that trigger an immediate post.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_min_level")]
    pub min_level: AlertLevel,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_throttle_secs() -> u64 {
    15
}

const fn default_batch_size() -> usize {
    5
}

const fn default_min_level() -> AlertLevel {
    AlertLevel::Info
}

const fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            throttle_secs: default_throttle_secs(),
            batch_size: default_batch_size(),
            min_level: default_min_level(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AlertsConfig {
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Sentinel-file kill switch.
#[derive(Debug, Clone, Deserialize)]
pub struct KillSwitchConfig {
    /// While this file exists no exposure-increasing order is approved.
    #[serde(default = "default_kill_switch_file")]
    pub file: String,
}

fn default_kill_switch_file() -> String {
    "KILL_SWITCH".to_string()
}

impl Default for KillSwitchConfig {
    fn default() -> Self {
        Self {
            file: default_kill_switch_file(),
        }
    }
}
