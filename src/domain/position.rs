//! Position types owned by the position ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::{MarketId, PositionId};
use super::money::{change_bps, Price, Volume};
use super::signal::{ExitReason, ProtectiveParams, Side};

/// Lifecycle of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// Live, watched by the protective-exit monitor.
    Open,
    /// A closing order is in flight; not rescanned until it resolves.
    Closing,
    /// Fully unwound.
    Closed,
}

impl PositionStatus {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

/// A directional holding in one market.
///
/// `quantity` is always non-negative; direction lives in `side`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    id: PositionId,
    market_id: MarketId,
    side: Side,
    quantity: Volume,
    entry_price: Price,
    opened_at: DateTime<Utc>,
    protective: ProtectiveParams,
    status: PositionStatus,
    mark_price: Option<Price>,
    realized_pnl: Decimal,
    exit_reason: Option<ExitReason>,
}

impl Position {
    /// Open a new position from its first fill.
    #[must_use]
    pub fn open(
        id: PositionId,
        market_id: MarketId,
        side: Side,
        quantity: Volume,
        entry_price: Price,
        opened_at: DateTime<Utc>,
        protective: ProtectiveParams,
    ) -> Self {
        Self {
            id,
            market_id,
            side,
            quantity,
            entry_price,
            opened_at,
            protective,
            status: PositionStatus::Open,
            mark_price: None,
            realized_pnl: Decimal::ZERO,
            exit_reason: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PositionId {
        self.id
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn quantity(&self) -> Volume {
        self.quantity
    }

    /// Signed quantity: positive long, negative short.
    #[must_use]
    pub fn signed_quantity(&self) -> Volume {
        self.quantity * self.side.sign()
    }

    #[must_use]
    pub const fn entry_price(&self) -> Price {
        self.entry_price
    }

    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    #[must_use]
    pub const fn protective(&self) -> &ProtectiveParams {
        &self.protective
    }

    #[must_use]
    pub const fn status(&self) -> PositionStatus {
        self.status
    }

    #[must_use]
    pub const fn mark_price(&self) -> Option<Price> {
        self.mark_price
    }

    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    #[must_use]
    pub const fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason
    }

    /// Entry notional of the open quantity.
    #[must_use]
    pub fn notional(&self) -> Price {
        (self.quantity * self.entry_price).abs()
    }

    /// Unrealized P&L at the last mark, zero before the first mark.
    #[must_use]
    pub fn unrealized_pnl(&self) -> Decimal {
        self.mark_price.map_or(Decimal::ZERO, |mark| {
            (mark - self.entry_price) * self.quantity * self.side.sign()
        })
    }

    /// Move since entry in basis points, positive when in our favour.
    #[must_use]
    pub fn favorable_move_bps(&self) -> Option<Decimal> {
        self.mark_price
            .map(|mark| change_bps(self.entry_price, mark) * self.side.sign())
    }

    /// Which protective exit, if any, the position has reached at `now`.
    ///
    /// Price exits take precedence over the time stop.
    #[must_use]
    pub fn exit_trigger(&self, now: DateTime<Utc>) -> Option<ExitReason> {
        if let Some(move_bps) = self.favorable_move_bps() {
            if move_bps <= -Decimal::from(self.protective.stop_loss_bps) {
                return Some(ExitReason::StopLoss);
            }
            if move_bps >= Decimal::from(self.protective.take_profit_bps) {
                return Some(ExitReason::TakeProfit);
            }
        }
        let age_ms = now.signed_duration_since(self.opened_at).num_milliseconds();
        let limit_ms = i64::try_from(self.protective.time_stop.as_millis()).unwrap_or(i64::MAX);
        if age_ms >= limit_ms {
            return Some(ExitReason::TimeStop);
        }
        None
    }

    pub(crate) fn set_mark(&mut self, price: Price) {
        self.mark_price = Some(price);
    }

    pub(crate) fn set_status(&mut self, status: PositionStatus) {
        self.status = status;
    }

    pub(crate) fn set_exit_reason(&mut self, reason: ExitReason) {
        self.exit_reason = Some(reason);
    }

    /// Add to the position at `price`, averaging the entry.
    pub(crate) fn add(&mut self, quantity: Volume, price: Price) {
        let total = self.quantity + quantity;
        if total.is_zero() {
            return;
        }
        self.entry_price = (self.entry_price * self.quantity + price * quantity) / total;
        self.quantity = total;
    }

    /// Reduce the position at `price`; returns the realized P&L of the
    /// reduced quantity. Quantity is clamped to what is open.
    pub(crate) fn reduce(&mut self, quantity: Volume, price: Price) -> Decimal {
        let closed = quantity.min(self.quantity);
        let pnl = (price - self.entry_price) * closed * self.side.sign();
        self.quantity -= closed;
        self.realized_pnl += pnl;
        if self.quantity.is_zero() {
            self.status = PositionStatus::Closed;
        }
        pnl
    }
}
