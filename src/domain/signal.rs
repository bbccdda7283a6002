//! Trading signals: what the strategy or the exit monitor wants to trade.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{EventId, MarketId, PositionId, SignalId};
use super::money::{Price, Volume};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// `+1` for buys, `-1` for sells.
    #[must_use]
    pub const fn sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit thresholds attached at entry and carried by the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectiveParams {
    pub take_profit_bps: u32,
    pub stop_loss_bps: u32,
    pub time_stop: Duration,
}

/// Why a protective exit fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TimeStop,
}

impl ExitReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TakeProfit => "take_profit",
            Self::StopLoss => "stop_loss",
            Self::TimeStop => "time_stop",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a signal adds risk or unwinds an existing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalIntent {
    /// Open or add to a position.
    Open,
    /// Reduce the given position; never blocked by halts.
    Close {
        position_id: PositionId,
        reason: ExitReason,
    },
}

/// A candidate trade.
///
/// Immutable: resizing produces a new value with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    /// Anomaly that produced this signal, for entry signals.
    pub origin_event: Option<EventId>,
    pub market_id: MarketId,
    pub side: Side,
    pub size: Volume,
    pub limit_price: Price,
    /// Smallest order the venue accepts on this market.
    pub min_size: Volume,
    pub protective: ProtectiveParams,
    pub intent: SignalIntent,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    /// True for signals that open or add to a position.
    #[must_use]
    pub const fn is_exposure_increasing(&self) -> bool {
        matches!(self.intent, SignalIntent::Open)
    }

    /// Absolute notional value of the order.
    #[must_use]
    pub fn notional(&self) -> Price {
        (self.size * self.limit_price).abs()
    }

    /// Copy of this signal with a different size. Side and id are kept.
    #[must_use]
    pub fn with_size(&self, size: Volume) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn signal() -> Signal {
        Signal {
            id: SignalId::new(),
            origin_event: None,
            market_id: MarketId::from("m1"),
            side: Side::Sell,
            size: dec!(10),
            limit_price: dec!(0.55),
            min_size: dec!(1),
            protective: ProtectiveParams {
                take_profit_bps: 40,
                stop_loss_bps: 25,
                time_stop: Duration::from_secs(600),
            },
            intent: SignalIntent::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn side_opposite_and_sign() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.sign(), dec!(-1));
    }

    #[test]
    fn with_size_keeps_identity_and_side() {
        let original = signal();
        let resized = original.with_size(dec!(4));
        assert_eq!(resized.id, original.id);
        assert_eq!(resized.side, Side::Sell);
        assert_eq!(resized.size, dec!(4));
        assert_eq!(resized.notional(), dec!(2.20));
    }

    #[test]
    fn close_signals_are_not_exposure_increasing() {
        let mut closing = signal();
        closing.intent = SignalIntent::Close {
            position_id: PositionId::new(1),
            reason: ExitReason::StopLoss,
        };
        assert!(!closing.is_exposure_increasing());
        assert!(signal().is_exposure_increasing());
    }

    #[test]
    fn close_intent_survives_serialization() {
        let intent = SignalIntent::Close {
            position_id: PositionId::new(3),
            reason: ExitReason::TimeStop,
        };
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("\"position_id\":3"));
        let back: SignalIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }
}
