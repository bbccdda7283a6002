//! Per-market rolling feature window.
//!
//! One [`FeatureAggregator`] exists per monitored market and is only ever
//! driven by that market's snapshot stream, so it needs no locking.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;

use crate::domain::{MarketId, MetricStats, Price, RollingStats, Snapshot};
use crate::error::FeedError;

/// Window and sampling parameters for the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Samples older than this, relative to the newest, are dropped.
    pub window: Duration,
    /// Baseline samples required before statistics are considered usable.
    pub min_samples: usize,
    /// Elapsed time assumed for the first snapshot's churn rate.
    pub sample_interval: Duration,
    /// Lookback for the mid-price move that gives the flow direction.
    pub move_lookback: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1800),
            min_samples: 10,
            sample_interval: Duration::from_secs(5),
            move_lookback: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    timestamp: DateTime<Utc>,
    volume: f64,
    churn: f64,
    mid: Price,
}

/// Rolling statistics for a single market.
pub struct FeatureAggregator {
    market_id: MarketId,
    settings: AggregatorSettings,
    window: VecDeque<Sample>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl FeatureAggregator {
    #[must_use]
    pub fn new(market_id: MarketId, settings: AggregatorSettings) -> Self {
        Self {
            market_id,
            settings,
            window: VecDeque::new(),
            last_timestamp: None,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    /// Samples currently held, latest included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Fold a snapshot into the window and return updated statistics.
    ///
    /// A rejected snapshot leaves the window untouched.
    pub fn ingest(&mut self, snapshot: &Snapshot) -> Result<RollingStats, FeedError> {
        if snapshot.market_id != self.market_id {
            return Err(FeedError::Malformed {
                market_id: snapshot.market_id.clone(),
                field: "market_id",
                reason: format!("routed to aggregator for {}", self.market_id),
            });
        }
        snapshot.validate()?;

        let elapsed = match self.last_timestamp {
            Some(last) if snapshot.timestamp <= last => {
                return Err(FeedError::OutOfOrder {
                    market_id: snapshot.market_id.clone(),
                    reason: format!("timestamp {} not after {}", snapshot.timestamp, last),
                });
            }
            Some(last) => (snapshot.timestamp - last)
                .to_std()
                .unwrap_or(self.settings.sample_interval),
            None => self.settings.sample_interval,
        };

        let volume = snapshot
            .volume
            .to_f64()
            .ok_or_else(|| FeedError::Malformed {
                market_id: snapshot.market_id.clone(),
                field: "volume",
                reason: "not representable as f64".to_string(),
            })?;
        let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
        let churn = snapshot.trade_count as f64 / seconds;

        self.window.push_back(Sample {
            timestamp: snapshot.timestamp,
            volume,
            churn,
            mid: snapshot.mid(),
        });
        self.last_timestamp = Some(snapshot.timestamp);
        self.trim(snapshot.timestamp);

        Ok(self.stats(snapshot))
    }

    fn trim(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = cutoff(now, self.settings.window) else {
            return;
        };
        while self.window.front().is_some_and(|s| s.timestamp < cutoff) {
            self.window.pop_front();
        }
    }

    fn stats(&self, snapshot: &Snapshot) -> RollingStats {
        let baseline_len = self.window.len().saturating_sub(1);
        let baseline = self.window.iter().take(baseline_len);
        let volumes: Vec<f64> = baseline.clone().map(|s| s.volume).collect();
        let churns: Vec<f64> = baseline.map(|s| s.churn).collect();

        let latest = self.window.back();
        let volume = MetricStats::from_baseline(latest.map_or(0.0, |s| s.volume), &volumes);
        let churn = MetricStats::from_baseline(latest.map_or(0.0, |s| s.churn), &churns);
        let sufficient = baseline_len >= self.settings.min_samples;

        trace!(
            market_id = %self.market_id,
            samples = baseline_len,
            volume_z = ?volume.z_score,
            churn_z = ?churn.z_score,
            "Stats updated"
        );

        let (price_move, recent_volume) = self.recent_move(snapshot.timestamp);
        let impact_per_volume = if recent_volume > f64::EPSILON {
            price_move.abs().to_f64().unwrap_or(0.0) / recent_volume
        } else {
            0.0
        };

        RollingStats {
            market_id: self.market_id.clone(),
            as_of: snapshot.timestamp,
            sample_count: baseline_len,
            sufficient,
            volume,
            churn,
            mid: snapshot.mid(),
            best_bid: snapshot.best_bid,
            best_ask: snapshot.best_ask,
            price_move,
            impact_per_volume,
        }
    }

    /// Mid change between the oldest sample inside the lookback and the
    /// latest, with the volume traded over those samples.
    fn recent_move(&self, now: DateTime<Utc>) -> (Price, f64) {
        let since = cutoff(now, self.settings.move_lookback);
        let mut recent = self
            .window
            .iter()
            .filter(|s| since.map_or(true, |c| s.timestamp >= c))
            .peekable();
        let Some(first_mid) = recent.peek().map(|s| s.mid) else {
            return (Decimal::ZERO, 0.0);
        };
        let volume: f64 = recent.map(|s| s.volume).sum();
        let price_move = self.window.back().map_or(Decimal::ZERO, |last| last.mid - first_mid);
        (price_move, volume)
    }
}

fn cutoff(now: DateTime<Utc>, span: Duration) -> Option<DateTime<Utc>> {
    ChronoDuration::from_std(span)
        .ok()
        .and_then(|span| now.checked_sub_signed(span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(at: DateTime<Utc>, volume: Decimal, trades: u64, mid: Decimal) -> Snapshot {
        Snapshot {
            market_id: MarketId::from("m1"),
            timestamp: at,
            volume,
            trade_count: trades,
            best_bid: mid - dec!(0.01),
            best_ask: mid + dec!(0.01),
        }
    }

    fn aggregator() -> FeatureAggregator {
        FeatureAggregator::new(MarketId::from("m1"), AggregatorSettings::default())
    }

    #[test]
    fn insufficient_until_min_samples() {
        let mut agg = aggregator();
        let start = Utc::now();
        for i in 0..10 {
            let at = start + ChronoDuration::seconds(5 * i);
            let stats = agg.ingest(&snapshot(at, dec!(10), 2, dec!(0.5))).unwrap();
            assert!(!stats.sufficient);
        }
        let at = start + ChronoDuration::seconds(50);
        let stats = agg.ingest(&snapshot(at, dec!(10), 2, dec!(0.5))).unwrap();
        assert_eq!(stats.sample_count, 10);
        assert!(stats.sufficient);
    }

    #[test]
    fn spike_scores_against_baseline_without_latest() {
        let mut agg = aggregator();
        let start = Utc::now();
        for i in 0..10 {
            let volume = if i % 2 == 0 { dec!(9) } else { dec!(11) };
            let at = start + ChronoDuration::seconds(5 * i);
            agg.ingest(&snapshot(at, volume, 2, dec!(0.5))).unwrap();
        }
        let at = start + ChronoDuration::seconds(50);
        let stats = agg.ingest(&snapshot(at, dec!(50), 2, dec!(0.5))).unwrap();
        // baseline mean 10, std 1
        assert!((stats.volume.z_score.unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(stats.churn.z_score, Some(0.0));
    }

    #[test]
    fn out_of_order_snapshot_leaves_state_unchanged() {
        let mut agg = aggregator();
        let start = Utc::now();
        agg.ingest(&snapshot(start, dec!(1), 1, dec!(0.5))).unwrap();
        let err = agg
            .ingest(&snapshot(start, dec!(1), 1, dec!(0.5)))
            .unwrap_err();
        assert!(matches!(err, FeedError::OutOfOrder { .. }));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let mut agg = aggregator();
        let mut bad = snapshot(Utc::now(), dec!(1), 1, dec!(0.5));
        bad.best_bid = Decimal::ZERO;
        assert!(agg.ingest(&bad).is_err());
        assert!(agg.is_empty());
    }

    #[test]
    fn window_drops_old_samples() {
        let settings = AggregatorSettings {
            window: Duration::from_secs(20),
            ..AggregatorSettings::default()
        };
        let mut agg = FeatureAggregator::new(MarketId::from("m1"), settings);
        let start = Utc::now();
        for i in 0..10 {
            let at = start + ChronoDuration::seconds(5 * i);
            agg.ingest(&snapshot(at, dec!(1), 1, dec!(0.5))).unwrap();
        }
        // 45s: keeps samples at 25..=45
        assert_eq!(agg.len(), 5);
    }

    #[test]
    fn price_move_tracks_mid_over_lookback() {
        let mut agg = aggregator();
        let start = Utc::now();
        agg.ingest(&snapshot(start, dec!(1), 1, dec!(0.40))).unwrap();
        let stats = agg
            .ingest(&snapshot(start + ChronoDuration::seconds(5), dec!(1), 1, dec!(0.45)))
            .unwrap();
        assert_eq!(stats.price_move, dec!(0.05));
    }

    #[test]
    fn impact_is_move_per_unit_of_recent_volume() {
        let mut agg = aggregator();
        let start = Utc::now();
        agg.ingest(&snapshot(start, dec!(30), 1, dec!(0.40))).unwrap();
        let stats = agg
            .ingest(&snapshot(start + ChronoDuration::seconds(5), dec!(20), 1, dec!(0.35)))
            .unwrap();
        // 0.05 moved over 50 traded
        assert!((stats.impact_per_volume - 0.001).abs() < 1e-12);
    }

    #[test]
    fn impact_is_zero_without_volume() {
        let mut agg = aggregator();
        let start = Utc::now();
        agg.ingest(&snapshot(start, dec!(0), 0, dec!(0.40))).unwrap();
        let stats = agg
            .ingest(&snapshot(start + ChronoDuration::seconds(5), dec!(0), 0, dec!(0.45)))
            .unwrap();
        assert_eq!(stats.price_move, dec!(0.05));
        assert_eq!(stats.impact_per_volume, 0.0);
    }

    #[test]
    fn impact_ignores_volume_outside_the_lookback() {
        let settings = AggregatorSettings {
            move_lookback: Duration::from_secs(10),
            ..AggregatorSettings::default()
        };
        let mut agg = FeatureAggregator::new(MarketId::from("m1"), settings);
        let start = Utc::now();
        agg.ingest(&snapshot(start, dec!(1000), 1, dec!(0.50))).unwrap();
        agg.ingest(&snapshot(start + ChronoDuration::seconds(30), dec!(5), 1, dec!(0.50)))
            .unwrap();
        let stats = agg
            .ingest(&snapshot(start + ChronoDuration::seconds(35), dec!(5), 1, dec!(0.52)))
            .unwrap();
        assert_eq!(stats.price_move, dec!(0.02));
        assert!((stats.impact_per_volume - 0.002).abs() < 1e-12);
    }
}
