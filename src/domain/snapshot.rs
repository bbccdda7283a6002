//! Market snapshots produced by the feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::MarketId;
use super::money::{Price, Volume};
use crate::error::FeedError;

/// Point-in-time view of one market's activity.
///
/// `volume` and `trade_count` cover the interval since the previous
/// snapshot of the same market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub market_id: MarketId,
    pub timestamp: DateTime<Utc>,
    pub volume: Volume,
    pub trade_count: u64,
    pub best_bid: Price,
    pub best_ask: Price,
}

impl Snapshot {
    /// Midpoint of the best bid and ask.
    #[must_use]
    pub fn mid(&self) -> Price {
        (self.best_bid + self.best_ask) / Decimal::TWO
    }

    /// Check field-level sanity. A failing snapshot must be dropped.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.volume < Decimal::ZERO {
            return Err(self.malformed("volume", "must not be negative"));
        }
        if self.best_bid <= Decimal::ZERO {
            return Err(self.malformed("best_bid", "must be positive"));
        }
        if self.best_ask <= Decimal::ZERO {
            return Err(self.malformed("best_ask", "must be positive"));
        }
        if self.best_ask < self.best_bid {
            return Err(self.malformed("best_ask", "book is crossed"));
        }
        Ok(())
    }

    fn malformed(&self, field: &'static str, reason: &str) -> FeedError {
        FeedError::Malformed {
            market_id: self.market_id.clone(),
            field,
            reason: reason.to_string(),
        }
    }
}
