//! Rolling-window statistics derived from snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::MarketId;
use super::money::Price;

/// Summary of one metric over the rolling window.
///
/// `mean` and `std_dev` describe the baseline, i.e. the window without the
/// latest sample. `z_score` is `None` only for an empty baseline. A flat
/// baseline scores any departure from its mean as an infinite z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub latest: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub z_score: Option<f64>,
}

impl MetricStats {
    /// Compute baseline statistics and the z-score of `latest` against them.
    ///
    /// Uses the population standard deviation.
    #[must_use]
    pub fn from_baseline(latest: f64, baseline: &[f64]) -> Self {
        if baseline.is_empty() {
            return Self {
                latest,
                mean: 0.0,
                std_dev: 0.0,
                z_score: None,
            };
        }
        let n = baseline.len() as f64;
        let mean = baseline.iter().sum::<f64>() / n;
        let variance = baseline.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let z_score = Some(if std_dev > f64::EPSILON {
            (latest - mean) / std_dev
        } else {
            flat_z(latest - mean)
        });
        Self {
            latest,
            mean,
            std_dev,
            z_score,
        }
    }
}

fn flat_z(delta: f64) -> f64 {
    if delta > f64::EPSILON {
        f64::INFINITY
    } else if delta < -f64::EPSILON {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

/// Per-market statistics produced by the feature aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub market_id: MarketId,
    /// Timestamp of the latest snapshot in the window.
    pub as_of: DateTime<Utc>,
    /// Number of baseline samples (window minus the latest snapshot).
    pub sample_count: usize,
    /// False when there are too few samples for a meaningful baseline.
    /// Insufficient stats can never produce an anomaly.
    pub sufficient: bool,
    pub volume: MetricStats,
    pub churn: MetricStats,
    pub mid: Price,
    pub best_bid: Price,
    pub best_ask: Price,
    /// Mid change over the configured lookback, the apparent direction of flow.
    pub price_move: Price,
    /// `|price_move|` per unit of volume traded over the same lookback.
    /// Zero when nothing traded.
    pub impact_per_volume: f64,
}
