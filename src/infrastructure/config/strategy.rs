//! Detection and fade strategy configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::aggregator::AggregatorSettings;
use crate::application::detector::DetectorSettings;
use crate::application::strategy::StrategySettings;

/// Rolling window and anomaly threshold settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Baseline window length.
    #[serde(default = "default_baseline_window_secs")]
    pub baseline_window_secs: u64,
    /// Baseline samples needed before anything can fire.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    /// Quiet period per market after an anomaly.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Lookback for the price move that sets the fade direction.
    #[serde(default = "default_move_lookback_secs")]
    pub move_lookback_secs: u64,
}

const fn default_baseline_window_secs() -> u64 {
    1800
}

const fn default_min_samples() -> usize {
    10
}

const fn default_z_threshold() -> f64 {
    3.0
}

const fn default_cooldown_secs() -> u64 {
    120
}

const fn default_move_lookback_secs() -> u64 {
    60
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            baseline_window_secs: default_baseline_window_secs(),
            min_samples: default_min_samples(),
            z_threshold: default_z_threshold(),
            cooldown_secs: default_cooldown_secs(),
            move_lookback_secs: default_move_lookback_secs(),
        }
    }
}

impl DetectorConfig {
    /// Aggregator settings; the poll interval is the nominal sample spacing.
    #[must_use]
    pub const fn aggregator(&self, poll_interval: Duration) -> AggregatorSettings {
        AggregatorSettings {
            window: Duration::from_secs(self.baseline_window_secs),
            min_samples: self.min_samples,
            sample_interval: poll_interval,
            move_lookback: Duration::from_secs(self.move_lookback_secs),
        }
    }

    #[must_use]
    pub const fn detector(&self) -> DetectorSettings {
        DetectorSettings {
            z_threshold: self.z_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}

/// Fade entry pricing and protective exit thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_take_profit_bps")]
    pub take_profit_bps: u32,
    #[serde(default = "default_stop_loss_bps")]
    pub stop_loss_bps: u32,
    #[serde(default = "default_time_stop_min")]
    pub time_stop_min: u64,
    #[serde(default = "default_entry_offset_bps")]
    pub entry_offset_bps: u32,
    /// Largest mid move per unit of recent volume that is still faded.
    #[serde(default = "default_min_impact_per_volume")]
    pub min_impact_per_volume: f64,
}

const fn default_take_profit_bps() -> u32 {
    40
}

const fn default_stop_loss_bps() -> u32 {
    25
}

const fn default_time_stop_min() -> u64 {
    10
}

const fn default_entry_offset_bps() -> u32 {
    5
}

const fn default_min_impact_per_volume() -> f64 {
    0.002
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            take_profit_bps: default_take_profit_bps(),
            stop_loss_bps: default_stop_loss_bps(),
            time_stop_min: default_time_stop_min(),
            entry_offset_bps: default_entry_offset_bps(),
            min_impact_per_volume: default_min_impact_per_volume(),
        }
    }
}

impl From<&StrategyConfig> for StrategySettings {
    fn from(config: &StrategyConfig) -> Self {
        Self {
            take_profit_bps: config.take_profit_bps,
            stop_loss_bps: config.stop_loss_bps,
            time_stop: Duration::from_secs(config.time_stop_min * 60),
            entry_offset_bps: config.entry_offset_bps,
            min_impact_per_volume: config.min_impact_per_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_application_defaults() {
        let detector = DetectorConfig::default();
        assert_eq!(
            detector.aggregator(Duration::from_secs(5)),
            AggregatorSettings::default()
        );
        assert_eq!(detector.detector(), DetectorSettings::default());
        assert_eq!(
            StrategySettings::from(&StrategyConfig::default()),
            StrategySettings::default()
        );
    }
}
