//! Market selection and venue connection configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::adapter::outbound::feed::MarketDefaults;

/// Which markets to monitor and how often to poll them.
///
/// A non-empty allowlist wins; otherwise the `top_n` active markets by
/// volume are discovered at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsConfig {
    #[serde(default)]
    pub allowlist: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

const fn default_top_n() -> usize {
    10
}

const fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            top_n: default_top_n(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl MarketsConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Venue REST API settings, shared by the feed and live order placement.
///
/// API credentials come from `FADEBOT_API_KEY` and `FADEBOT_API_PASSPHRASE`.
#[derive(Clone, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Tick size assumed when the venue does not report one.
    #[serde(default = "default_tick_size")]
    pub default_tick_size: Decimal,
    /// Minimum order size assumed when the venue does not report one.
    #[serde(default = "default_min_order_size")]
    pub default_min_order_size: Decimal,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub api_passphrase: Option<String>,
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_tick_size() -> Decimal {
    Decimal::new(1, 2)
}

fn default_min_order_size() -> Decimal {
    Decimal::ONE
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            default_tick_size: default_tick_size(),
            default_min_order_size: default_min_order_size(),
            api_key: None,
            api_passphrase: None,
        }
    }
}

impl VenueConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub const fn market_defaults(&self) -> MarketDefaults {
        MarketDefaults {
            tick_size: self.default_tick_size,
            min_order_size: self.default_min_order_size,
        }
    }
}

impl std::fmt::Debug for VenueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueConfig")
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("default_tick_size", &self.default_tick_size)
            .field("default_min_order_size", &self.default_min_order_size)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "api_passphrase",
                &self.api_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
