//! Fade strategy.
//!
//! Takes the side opposite to the mid-price move that accompanied an anomaly,
//! expecting the move to revert. Pure: the same event, market and limits
//! always produce the same signal shape.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use crate::application::state::{RiskLimits, SizingMode};
use crate::domain::money::{bps_to_fraction, floor_size};
use crate::domain::{
    AnomalyEvent, Market, Price, ProtectiveParams, Side, Signal, SignalId, SignalIntent, Volume,
};

/// Exit thresholds and pricing for fade entries.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub take_profit_bps: u32,
    pub stop_loss_bps: u32,
    pub time_stop: Duration,
    /// Distance from mid of the entry limit, crossing toward the touch.
    pub entry_offset_bps: u32,
    /// Anomalies whose mid moved more than this per unit of volume are not
    /// faded; the book is too thin for the move to be noise.
    pub min_impact_per_volume: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            take_profit_bps: 40,
            stop_loss_bps: 25,
            time_stop: Duration::from_secs(600),
            entry_offset_bps: 5,
            min_impact_per_volume: 0.002,
        }
    }
}

impl StrategySettings {
    #[must_use]
    pub const fn protective(&self) -> ProtectiveParams {
        ProtectiveParams {
            take_profit_bps: self.take_profit_bps,
            stop_loss_bps: self.stop_loss_bps,
            time_stop: self.time_stop,
        }
    }
}

/// Turns anomaly events into entry signals.
pub struct FadeStrategy {
    settings: StrategySettings,
}

impl FadeStrategy {
    #[must_use]
    pub const fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Propose a contrarian entry for an anomaly.
    ///
    /// Returns `None` when the move is flat, so there is nothing to fade,
    /// when the move per unit of volume exceeds `min_impact_per_volume`, or
    /// when the sized order is below the market minimum. The proposed size is
    /// already clamped to the per-market cap; the gatekeeper still enforces it.
    #[must_use]
    pub fn decide(
        &self,
        event: &AnomalyEvent,
        market: &Market,
        limits: &RiskLimits,
    ) -> Option<Signal> {
        let side = fade_side(event.price_move)?;
        if event.impact_per_volume > self.settings.min_impact_per_volume {
            debug!(
                market_id = %event.market_id,
                impact = event.impact_per_volume,
                limit = self.settings.min_impact_per_volume,
                "Price impact too high to fade"
            );
            return None;
        }

        let offset = bps_to_fraction(self.settings.entry_offset_bps);
        let raw = match side {
            Side::Buy => event.reference_price * (Decimal::ONE + offset),
            Side::Sell => event.reference_price * (Decimal::ONE - offset),
        };
        let limit_price = market.round_price(raw, side);
        if limit_price <= Decimal::ZERO {
            debug!(market_id = %event.market_id, price = %limit_price, "No valid entry price");
            return None;
        }

        let size = propose_size(limits, limit_price);
        if size <= Decimal::ZERO || size < market.min_order_size() {
            debug!(
                market_id = %event.market_id,
                size = %size,
                min = %market.min_order_size(),
                "Proposed size below market minimum"
            );
            return None;
        }

        Some(Signal {
            id: SignalId::new(),
            origin_event: Some(event.id),
            market_id: event.market_id.clone(),
            side,
            size,
            limit_price,
            min_size: market.min_order_size(),
            protective: self.settings.protective(),
            intent: SignalIntent::Open,
            created_at: event.timestamp,
        })
    }
}

/// Sell into a rise, buy into a drop.
fn fade_side(price_move: Price) -> Option<Side> {
    if price_move > Decimal::ZERO {
        Some(Side::Sell)
    } else if price_move < Decimal::ZERO {
        Some(Side::Buy)
    } else {
        None
    }
}

fn propose_size(limits: &RiskLimits, price: Price) -> Volume {
    let size = match limits.sizing {
        SizingMode::Fixed => limits.order_size_default,
        SizingMode::PercentOfBalance { fraction, balance } => floor_size(balance * fraction / price),
    };
    floor_size(size.min(limits.max_position_per_market))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnomalyMetric, EventId, MarketId, Severity};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn event(price_move: Decimal) -> AnomalyEvent {
        let now = Utc::now();
        AnomalyEvent {
            id: EventId::new(),
            market_id: MarketId::from("m1"),
            timestamp: now,
            metric: AnomalyMetric::Volume,
            z_score: 5.0,
            volume_z: Some(5.0),
            churn_z: None,
            severity: Severity::High,
            cooldown_until: now,
            reference_price: dec!(0.50),
            best_bid: dec!(0.49),
            best_ask: dec!(0.51),
            price_move,
            impact_per_volume: 0.0,
        }
    }

    fn market() -> Market {
        Market::new("m1", "Will it rain?", dec!(0.001), dec!(1))
    }

    #[test]
    fn fades_upward_move_with_sell() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let signal = strategy
            .decide(&event(dec!(0.03)), &market(), &RiskLimits::default())
            .unwrap();
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.size, dec!(10));
        // 0.50 * 0.9995 = 0.49975 rounded down to the tick
        assert_eq!(signal.limit_price, dec!(0.499));
        assert_eq!(signal.protective.stop_loss_bps, 25);
        assert!(signal.is_exposure_increasing());
    }

    #[test]
    fn fades_downward_move_with_buy() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let signal = strategy
            .decide(&event(dec!(-0.03)), &market(), &RiskLimits::default())
            .unwrap();
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.limit_price, dec!(0.501));
    }

    #[test]
    fn flat_move_has_nothing_to_fade() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        assert!(strategy
            .decide(&event(Decimal::ZERO), &market(), &RiskLimits::default())
            .is_none());
    }

    #[test]
    fn high_impact_move_is_not_faded() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let mut thin = event(dec!(0.03));
        thin.impact_per_volume = 0.01;
        assert!(strategy
            .decide(&thin, &market(), &RiskLimits::default())
            .is_none());
    }

    #[test]
    fn impact_at_the_limit_is_still_faded() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let mut event = event(dec!(-0.03));
        event.impact_per_volume = 0.002;
        let signal = strategy
            .decide(&event, &market(), &RiskLimits::default())
            .unwrap();
        assert_eq!(signal.side, Side::Buy);
    }

    #[test]
    fn percent_sizing_is_clamped_to_market_cap() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let limits = RiskLimits {
            sizing: SizingMode::PercentOfBalance {
                fraction: dec!(0.5),
                balance: dec!(1000),
            },
            ..RiskLimits::default()
        };
        let signal = strategy.decide(&event(dec!(0.01)), &market(), &limits).unwrap();
        // 500 / 0.499 is about 1002 shares, capped at 100
        assert_eq!(signal.size, dec!(100));
    }

    #[test]
    fn percent_sizing_rounds_down() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let limits = RiskLimits {
            sizing: SizingMode::PercentOfBalance {
                fraction: dec!(0.01),
                balance: dec!(100),
            },
            ..RiskLimits::default()
        };
        let signal = strategy.decide(&event(dec!(0.01)), &market(), &limits).unwrap();
        // 1 / 0.499 = 2.004...
        assert_eq!(signal.size, dec!(2.00));
    }

    #[test]
    fn size_below_market_minimum_is_dropped() {
        let strategy = FadeStrategy::new(StrategySettings::default());
        let market = Market::new("m1", "q", dec!(0.001), dec!(50));
        assert!(strategy
            .decide(&event(dec!(0.01)), &market, &RiskLimits::default())
            .is_none());
    }
}
