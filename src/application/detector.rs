//! Threshold detector over aggregator statistics.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info};

use crate::domain::{AnomalyEvent, AnomalyMetric, EventId, MarketId, RollingStats, Severity};

/// Detector thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Minimum z-score of volume or churn that fires an event.
    pub z_threshold: f64,
    /// Quiet period per market after an event fires.
    pub cooldown: Duration,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            cooldown: Duration::from_secs(120),
        }
    }
}

/// Emits anomaly events with a per-market cooldown.
///
/// Cooldowns are measured on snapshot time, not wall-clock time, so replayed
/// data behaves the same as live data.
pub struct AnomalyDetector {
    settings: DetectorSettings,
    cooldowns: HashMap<MarketId, DateTime<Utc>>,
}

impl AnomalyDetector {
    #[must_use]
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            cooldowns: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// End of the active cooldown for a market, if any.
    #[must_use]
    pub fn cooldown_until(&self, market_id: &MarketId) -> Option<DateTime<Utc>> {
        self.cooldowns.get(market_id).copied()
    }

    /// Evaluate fresh statistics.
    ///
    /// Insufficient statistics never fire. When both metrics cross the
    /// threshold the larger z-score is reported as the trigger.
    pub fn evaluate(&mut self, stats: &RollingStats) -> Option<AnomalyEvent> {
        if !stats.sufficient {
            return None;
        }

        let threshold = self.settings.z_threshold;
        let fired = |z: Option<f64>| z.filter(|z| *z > threshold);
        let volume = fired(stats.volume.z_score).map(|z| (AnomalyMetric::Volume, z));
        let churn = fired(stats.churn.z_score).map(|z| (AnomalyMetric::Churn, z));
        let (metric, z_score) = match (volume, churn) {
            (Some(v), Some(c)) => {
                if c.1 > v.1 {
                    c
                } else {
                    v
                }
            }
            (Some(v), None) => v,
            (None, Some(c)) => c,
            (None, None) => return None,
        };

        if let Some(until) = self.cooldowns.get(&stats.market_id) {
            if stats.as_of < *until {
                debug!(
                    market_id = %stats.market_id,
                    metric = %metric,
                    z_score,
                    until = %until,
                    "Anomaly suppressed by cooldown"
                );
                return None;
            }
        }

        let cooldown = ChronoDuration::from_std(self.settings.cooldown).unwrap_or(ChronoDuration::zero());
        let cooldown_until = stats
            .as_of
            .checked_add_signed(cooldown)
            .unwrap_or(stats.as_of);
        self.cooldowns.insert(stats.market_id.clone(), cooldown_until);

        let severity = Severity::classify(z_score, threshold);
        info!(
            market_id = %stats.market_id,
            metric = %metric,
            z_score,
            severity = severity.as_str(),
            "Anomaly detected"
        );

        Some(AnomalyEvent {
            id: EventId::new(),
            market_id: stats.market_id.clone(),
            timestamp: stats.as_of,
            metric,
            z_score,
            volume_z: stats.volume.z_score,
            churn_z: stats.churn.z_score,
            severity,
            cooldown_until,
            reference_price: stats.mid,
            best_bid: stats.best_bid,
            best_ask: stats.best_ask,
            price_move: stats.price_move,
            impact_per_volume: stats.impact_per_volume,
        })
    }
}
