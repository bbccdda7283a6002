//! Order submission and protective-exit timing.

use std::time::Duration;

use serde::Deserialize;

use crate::application::execution::RetryPolicy;

/// Retry, deadline and shutdown settings for order submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Total attempts per order, first included.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Random extra delay as a fraction of the backoff.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Budget for all attempts of one order.
    #[serde(default = "default_order_deadline_secs")]
    pub order_deadline_secs: u64,
    /// How long in-flight orders may run once shutdown starts.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

const fn default_jitter() -> f64 {
    0.2
}

const fn default_order_deadline_secs() -> u64 {
    30
}

const fn default_drain_timeout_secs() -> u64 {
    30
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter: default_jitter(),
            order_deadline_secs: default_order_deadline_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl ExecutionConfig {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            jitter: self.jitter,
            deadline: Duration::from_secs(self.order_deadline_secs),
        }
    }

    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Protective-exit scan period.
#[derive(Debug, Clone, Deserialize)]
pub struct ExitMonitorConfig {
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
}

const fn default_scan_interval_ms() -> u64 {
    1_000
}

impl Default for ExitMonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
        }
    }
}

impl ExitMonitorConfig {
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}
