//! Anomaly events emitted by the detector.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EventId, MarketId};
use super::money::Price;

/// The statistic that triggered an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMetric {
    Volume,
    Churn,
}

impl AnomalyMetric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Churn => "churn",
        }
    }
}

impl fmt::Display for AnomalyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far past the threshold the triggering z-score landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Elevated,
    High,
    Extreme,
}

impl Severity {
    /// Classify a z-score relative to the firing threshold.
    #[must_use]
    pub fn classify(z_score: f64, threshold: f64) -> Self {
        let ratio = if threshold > 0.0 {
            z_score.abs() / threshold
        } else {
            f64::INFINITY
        };
        if ratio >= 2.5 {
            Self::Extreme
        } else if ratio >= 1.5 {
            Self::High
        } else {
            Self::Elevated
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

/// A detected abnormal volume or churn episode on one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub id: EventId,
    pub market_id: MarketId,
    pub timestamp: DateTime<Utc>,
    /// The metric reported as the trigger (larger z-score on ties).
    pub metric: AnomalyMetric,
    pub z_score: f64,
    pub volume_z: Option<f64>,
    pub churn_z: Option<f64>,
    pub severity: Severity,
    /// No further event fires on this market before this instant.
    pub cooldown_until: DateTime<Utc>,
    pub reference_price: Price,
    pub best_bid: Price,
    pub best_ask: Price,
    /// Apparent direction of the move being faded.
    pub price_move: Price,
    /// Mid move per unit of recent volume; large values mean thin books.
    pub impact_per_volume: f64,
}
