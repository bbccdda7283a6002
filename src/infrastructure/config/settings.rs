//! Application configuration loading and validation.
//!
//! [`Config`] is read from a TOML file. Secrets come only from the
//! environment (`WALLET_PRIVATE_KEY`, `FADEBOT_KEYSTORE_PASSWORD`,
//! `FADEBOT_API_KEY`, `FADEBOT_API_PASSPHRASE`), and a few operational knobs
//! can be overridden there too.
//!
//! # Example
//!
//! ```no_run
//! use fadebot::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use super::alerts::{AlertsConfig, KillSwitchConfig};
use super::execution::{ExecutionConfig, ExitMonitorConfig};
use super::logging::LoggingConfig;
use super::markets::{MarketsConfig, VenueConfig};
use super::risk::{risk_limits, RiskConfig, SizingConfig, SizingKind};
use super::strategy::{DetectorConfig, StrategyConfig};
use super::wallet::{SignerConfig, SignerKind, WalletConfig};
use crate::application::orchestration::EngineSettings;
use crate::application::state::RiskLimits;
use crate::error::{ConfigError, Result};

/// Whether orders reach the real venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    /// Full pipeline with signing, but orders fill against a paper venue.
    #[default]
    Simulation,
    /// Orders are placed on the venue.
    Live,
}

impl TradingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulation => "simulation",
            Self::Live => "live",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simulation" | "sim" | "paper" => Some(Self::Simulation),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading_mode: TradingMode,
    #[serde(default)]
    pub markets: MarketsConfig,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    /// Local signing key source. The key itself is never read from the file.
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub kill_switch: KillSwitchConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub exit_monitor: ExitMonitorConfig,
}

fn read_keystore_password(env: &impl Fn(&str) -> Option<String>) -> Result<String> {
    if let Some(password) = env("FADEBOT_KEYSTORE_PASSWORD") {
        return Ok(password);
    }
    if let Some(path) = env("FADEBOT_KEYSTORE_PASSWORD_FILE") {
        let contents = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let password = contents.trim().to_string();
        if password.is_empty() {
            return Err(ConfigError::MissingField {
                field: "FADEBOT_KEYSTORE_PASSWORD_FILE",
            }
            .into());
        }
        return Ok(password);
    }

    Err(ConfigError::MissingField {
        field: "FADEBOT_KEYSTORE_PASSWORD",
    }
    .into())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

impl Config {
    /// Parse configuration from TOML content, applying overrides from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - An environment override has an invalid value
    /// - A keystore is configured but its password is not available
    /// - Validation fails
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Like [`Config::parse_toml`], reading environment values through `env`.
    ///
    /// # Errors
    ///
    /// See [`Config::parse_toml`].
    pub fn parse_toml_with_env(
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`Config::parse_toml`]
    /// fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = non_empty(env("TRADING_MODE")) {
            self.trading_mode = TradingMode::parse(&mode)
                .ok_or_else(|| invalid("TRADING_MODE", format!("unknown mode {mode:?}")))?;
        }
        if let Some(list) = env("ALLOWLIST_MARKETS") {
            let markets: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !markets.is_empty() {
                self.markets.allowlist = markets;
            }
        }
        if let Some(top_n) = non_empty(env("TOP_N_BY_VOLUME")) {
            self.markets.top_n = top_n
                .trim()
                .parse()
                .map_err(|_| invalid("TOP_N_BY_VOLUME", "must be a positive integer"))?;
        }
        if let Some(impact) = non_empty(env("MIN_IMPACT_PER_VOLUME")) {
            self.strategy.min_impact_per_volume = impact
                .trim()
                .parse()
                .map_err(|_| invalid("MIN_IMPACT_PER_VOLUME", "must be a number"))?;
        }
        if let Some(path) = non_empty(env("KILL_SWITCH_FILE")) {
            self.kill_switch.file = path;
        }
        if let Some(url) = non_empty(env("ALERT_WEBHOOK_URL")) {
            self.alerts.webhook_url = Some(url);
        }
        if let Some(mode) = non_empty(env("WALLET_SIGNER_MODE")) {
            self.signer.backend = match mode.trim().to_ascii_lowercase().as_str() {
                "local" => SignerKind::Local,
                "remote" | "external" => SignerKind::Remote,
                _ => {
                    return Err(invalid(
                        "WALLET_SIGNER_MODE",
                        format!("unknown signer mode {mode:?}"),
                    ))
                }
            };
        }
        if let Some(url) = non_empty(env("WALLET_SIGNER_URL")) {
            self.signer.remote_url = Some(url);
        }

        self.venue.api_key = non_empty(env("FADEBOT_API_KEY"));
        self.venue.api_passphrase = non_empty(env("FADEBOT_API_PASSPHRASE"));

        // Secrets never come from the file.
        self.wallet.private_key = non_empty(env("WALLET_PRIVATE_KEY"));
        self.wallet.keystore_password = None;
        if self.signer.backend == SignerKind::Local
            && self.wallet.private_key.is_none()
            && self.wallet.keystore_path.is_some()
        {
            self.wallet.keystore_password = Some(read_keystore_password(env)?);
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Checks that required fields are present and values are within range.
    fn validate(&self) -> Result<()> {
        if self.venue.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "venue.api_url",
            }
            .into());
        }
        Url::parse(&self.venue.api_url).map_err(|e| invalid("venue.api_url", e.to_string()))?;
        if self.venue.timeout_ms == 0 || self.venue.connect_timeout_ms == 0 {
            return Err(invalid("venue.timeout_ms", "timeouts must be greater than 0"));
        }
        if self.venue.default_tick_size <= Decimal::ZERO {
            return Err(invalid("venue.default_tick_size", "must be greater than 0"));
        }
        if self.venue.default_min_order_size < Decimal::ZERO {
            return Err(invalid("venue.default_min_order_size", "must be 0 or greater"));
        }

        if self.markets.poll_interval_secs == 0 {
            return Err(invalid("markets.poll_interval_secs", "must be greater than 0"));
        }
        if self.markets.allowlist.is_empty() && self.markets.top_n == 0 {
            return Err(invalid(
                "markets.top_n",
                "must be greater than 0 when no allowlist is set",
            ));
        }

        if !self.detector.z_threshold.is_finite() || self.detector.z_threshold <= 0.0 {
            return Err(invalid("detector.z_threshold", "must be a positive number"));
        }
        if self.detector.min_samples < 2 {
            return Err(invalid("detector.min_samples", "must be at least 2"));
        }
        if self.detector.baseline_window_secs <= self.markets.poll_interval_secs {
            return Err(invalid(
                "detector.baseline_window_secs",
                "must be longer than the poll interval",
            ));
        }

        if self.strategy.take_profit_bps == 0 || self.strategy.stop_loss_bps == 0 {
            return Err(invalid("strategy", "take profit and stop loss must be greater than 0"));
        }
        if self.strategy.time_stop_min == 0 {
            return Err(invalid("strategy.time_stop_min", "must be greater than 0"));
        }
        if !self.strategy.min_impact_per_volume.is_finite()
            || self.strategy.min_impact_per_volume < 0.0
        {
            return Err(invalid(
                "strategy.min_impact_per_volume",
                "must be a non-negative number",
            ));
        }

        if self.risk.max_position_per_market <= Decimal::ZERO {
            return Err(invalid("risk.max_position_per_market", "must be greater than 0"));
        }
        if self.risk.max_global_exposure <= Decimal::ZERO {
            return Err(invalid("risk.max_global_exposure", "must be greater than 0"));
        }
        if self.risk.max_daily_loss <= Decimal::ZERO {
            return Err(invalid("risk.max_daily_loss", "must be greater than 0"));
        }
        if self.risk.max_orders_per_minute == 0 {
            return Err(invalid("risk.max_orders_per_minute", "must be greater than 0"));
        }

        if self.sizing.order_size_default <= Decimal::ZERO {
            return Err(invalid("sizing.order_size_default", "must be greater than 0"));
        }
        if self.sizing.mode == SizingKind::Percent {
            match self.sizing.percent_of_balance {
                Some(p) if p > Decimal::ZERO && p <= Decimal::ONE => {}
                Some(_) => {
                    return Err(invalid("sizing.percent_of_balance", "must be in (0, 1]"));
                }
                None => {
                    return Err(ConfigError::MissingField {
                        field: "sizing.percent_of_balance",
                    }
                    .into());
                }
            }
            match self.sizing.balance_override {
                Some(b) if b > Decimal::ZERO => {}
                _ => {
                    return Err(invalid(
                        "sizing.balance_override",
                        "percent sizing needs a positive balance",
                    ));
                }
            }
        }

        if self.execution.retry_attempts == 0 {
            return Err(invalid("execution.retry_attempts", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.execution.jitter) {
            return Err(invalid("execution.jitter", "must be between 0 and 1"));
        }
        if self.execution.max_backoff_ms < self.execution.retry_backoff_ms {
            return Err(invalid("execution.max_backoff_ms", "must be >= retry_backoff_ms"));
        }
        if self.execution.order_deadline_secs == 0 {
            return Err(invalid("execution.order_deadline_secs", "must be greater than 0"));
        }
        if self.exit_monitor.scan_interval_ms == 0 {
            return Err(invalid("exit_monitor.scan_interval_ms", "must be greater than 0"));
        }

        if self.signer.backend == SignerKind::Remote {
            let url = self.signer.remote_url.as_deref().unwrap_or_default();
            if url.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "signer.remote_url",
                }
                .into());
            }
            Url::parse(url).map_err(|e| invalid("signer.remote_url", e.to_string()))?;
        }
        if self.signer.timeout_ms == 0 {
            return Err(invalid("signer.timeout_ms", "must be greater than 0"));
        }

        if let Some(url) = &self.alerts.webhook_url {
            Url::parse(url).map_err(|e| invalid("alerts.webhook_url", e.to_string()))?;
        }
        if self.alerts.batch_size == 0 {
            return Err(invalid("alerts.batch_size", "must be greater than 0"));
        }
        if self.kill_switch.file.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "kill_switch.file",
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.trading_mode, TradingMode::Live)
    }

    /// Limits held by the shared state.
    #[must_use]
    pub fn risk_limits(&self) -> RiskLimits {
        risk_limits(&self.risk, &self.sizing)
    }

    /// Engine timing and per-market pipeline settings.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let poll_interval = self.markets.poll_interval();
        EngineSettings {
            poll_interval,
            exit_scan_interval: self.exit_monitor.scan_interval(),
            drain_timeout: self.execution.drain_timeout(),
            aggregator: self.detector.aggregator(poll_interval),
            detector: self.detector.detector(),
            mode: self.trading_mode.to_string(),
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;

    const MINIMAL: &str = "[venue]\napi_url = \"https://venue.test/api\"\n";

    fn parse(content: &str, vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::parse_toml_with_env(content, move |key| vars.get(key).cloned())
    }

    fn invalid_field(result: Result<Config>) -> &'static str {
        match result {
            Err(Error::Config(ConfigError::InvalidValue { field, .. }))
            | Err(Error::Config(ConfigError::MissingField { field })) => field,
            other => panic!("expected a field error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse(MINIMAL, &[]).unwrap();
        assert_eq!(config.trading_mode, TradingMode::Simulation);
        assert_eq!(config.markets.poll_interval_secs, 5);
        assert_eq!(config.strategy.take_profit_bps, 40);
        assert_eq!(config.risk_limits(), RiskLimits::default());
        assert_eq!(config.kill_switch.file, "KILL_SWITCH");
        assert!(config.alerts.webhook_url.is_none());
    }

    #[test]
    fn missing_api_url_is_rejected() {
        assert_eq!(invalid_field(parse("", &[])), "venue.api_url");
    }

    #[test]
    fn env_overrides_apply() {
        let config = parse(
            MINIMAL,
            &[
                ("TRADING_MODE", "live"),
                ("ALLOWLIST_MARKETS", "a, b,,c"),
                ("KILL_SWITCH_FILE", "/tmp/halt"),
                ("ALERT_WEBHOOK_URL", "https://hooks.test/x"),
                ("FADEBOT_API_KEY", "key"),
                ("WALLET_PRIVATE_KEY", "0xabc"),
            ],
        )
        .unwrap();
        assert!(config.is_live());
        assert_eq!(config.markets.allowlist, vec!["a", "b", "c"]);
        assert_eq!(config.kill_switch.file, "/tmp/halt");
        assert_eq!(config.alerts.webhook_url.as_deref(), Some("https://hooks.test/x"));
        assert_eq!(config.venue.api_key.as_deref(), Some("key"));
        assert_eq!(config.wallet.private_key.as_deref(), Some("0xabc"));
    }

    #[test]
    fn private_key_in_file_is_ignored() {
        let content = format!("{MINIMAL}[wallet]\nprivate_key = \"0xfile\"\n");
        let config = parse(&content, &[]).unwrap();
        assert!(config.wallet.private_key.is_none());
    }

    #[test]
    fn unknown_trading_mode_is_rejected() {
        assert_eq!(invalid_field(parse(MINIMAL, &[("TRADING_MODE", "yolo")])), "TRADING_MODE");
    }

    #[test]
    fn percent_sizing_without_balance_is_rejected() {
        let content = format!("{MINIMAL}[sizing]\nmode = \"percent\"\npercent_of_balance = 0.05\n");
        assert_eq!(invalid_field(parse(&content, &[])), "sizing.balance_override");
    }

    #[test]
    fn percent_sizing_with_balance_is_accepted() {
        let content = format!(
            "{MINIMAL}[sizing]\nmode = \"percent\"\npercent_of_balance = 0.05\nbalance_override = 1000\n"
        );
        let config = parse(&content, &[]).unwrap();
        assert!(matches!(
            config.risk_limits().sizing,
            crate::application::state::SizingMode::PercentOfBalance { .. }
        ));
    }

    #[test]
    fn remote_signer_requires_url() {
        let content = format!("{MINIMAL}[signer]\nbackend = \"remote\"\n");
        assert_eq!(invalid_field(parse(&content, &[])), "signer.remote_url");

        let config = parse(&content, &[("WALLET_SIGNER_URL", "http://signer.test/sign")]).unwrap();
        assert_eq!(config.signer.backend, SignerKind::Remote);
    }

    #[test]
    fn keystore_requires_password() {
        let content = format!("{MINIMAL}[wallet]\nkeystore_path = \"/keys/k.json\"\n");
        assert_eq!(invalid_field(parse(&content, &[])), "FADEBOT_KEYSTORE_PASSWORD");

        let config = parse(&content, &[("FADEBOT_KEYSTORE_PASSWORD", "pw")]).unwrap();
        assert_eq!(config.wallet.keystore_password.as_deref(), Some("pw"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("[risk]\nmax_daily_loss = 0\n", "risk.max_daily_loss"),
            ("[detector]\nz_threshold = -1.0\n", "detector.z_threshold"),
            ("[execution]\nretry_attempts = 0\n", "execution.retry_attempts"),
            ("[markets]\npoll_interval_secs = 0\n", "markets.poll_interval_secs"),
            ("[alerts]\nbatch_size = 0\n", "alerts.batch_size"),
            (
                "[strategy]\nmin_impact_per_volume = -0.1\n",
                "strategy.min_impact_per_volume",
            ),
        ];
        for (section, field) in cases {
            let content = format!("{MINIMAL}{section}");
            assert_eq!(invalid_field(parse(&content, &[])), field, "{section}");
        }
    }

    #[test]
    fn impact_limit_comes_from_file_or_env() {
        assert_eq!(parse(MINIMAL, &[]).unwrap().strategy.min_impact_per_volume, 0.002);

        let content = format!("{MINIMAL}[strategy]\nmin_impact_per_volume = 0.01\n");
        assert_eq!(parse(&content, &[]).unwrap().strategy.min_impact_per_volume, 0.01);

        let config = parse(&content, &[("MIN_IMPACT_PER_VOLUME", "0.005")]).unwrap();
        assert_eq!(config.strategy.min_impact_per_volume, 0.005);
        assert_eq!(
            invalid_field(parse(MINIMAL, &[("MIN_IMPACT_PER_VOLUME", "lots")])),
            "MIN_IMPACT_PER_VOLUME"
        );
    }

    #[test]
    fn engine_settings_follow_config() {
        let content = format!("{MINIMAL}[markets]\npoll_interval_secs = 2\n[detector]\ncooldown_secs = 30\n");
        let settings = parse(&content, &[]).unwrap().engine_settings();
        assert_eq!(settings.poll_interval, std::time::Duration::from_secs(2));
        assert_eq!(settings.aggregator.sample_interval, std::time::Duration::from_secs(2));
        assert_eq!(settings.detector.cooldown, std::time::Duration::from_secs(30));
        assert_eq!(settings.mode, "simulation");
    }
}
