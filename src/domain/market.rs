//! Market metadata.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::id::MarketId;
use super::money::{Price, Volume};
use super::signal::Side;

/// A tradable market and its static venue metadata.
///
/// Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    id: MarketId,
    question: String,
    tick_size: Price,
    min_order_size: Volume,
}

impl Market {
    /// Create a new market.
    pub fn new(
        id: impl Into<MarketId>,
        question: impl Into<String>,
        tick_size: Price,
        min_order_size: Volume,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            tick_size,
            min_order_size,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub const fn tick_size(&self) -> Price {
        self.tick_size
    }

    #[must_use]
    pub const fn min_order_size(&self) -> Volume {
        self.min_order_size
    }

    /// Snap a price onto the tick grid, moving it in the direction that
    /// keeps the order marketable: buys round up, sells round down.
    #[must_use]
    pub fn round_price(&self, price: Price, side: Side) -> Price {
        if self.tick_size <= Decimal::ZERO {
            return price;
        }
        let ticks = price / self.tick_size;
        let strategy = match side {
            Side::Buy => RoundingStrategy::AwayFromZero,
            Side::Sell => RoundingStrategy::ToZero,
        };
        ticks.round_dp_with_strategy(0, strategy) * self.tick_size
    }
}
