//! Shared application state.
//!
//! The position ledger and the exposure ledger live behind one lock. Every
//! check-then-mutate sequence (gatekeeper reservations, fill commits,
//! protective-exit scans) runs inside a single critical section, and no
//! network call is ever made while the lock is held.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{
    ExitReason, Fill, MarketId, Position, PositionId, PositionStatus, Price, ReservationId, Side,
    Signal, SignalId, SignalIntent, Volume,
};

/// How the strategy sizes entry orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    /// Always propose the configured default order size.
    Fixed,
    /// Propose `balance * fraction / price` shares.
    PercentOfBalance {
        /// Fraction of the balance committed per order, in `(0, 1]`.
        fraction: Decimal,
        /// Operator-supplied balance figure.
        balance: Decimal,
    },
}

/// Risk limits configuration.
///
/// Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskLimits {
    /// Maximum open quantity per market, in shares.
    pub max_position_per_market: Volume,
    /// Maximum entry notional across all open positions.
    pub max_global_exposure: Decimal,
    /// Realized loss for the trading day that halts new exposure.
    pub max_daily_loss: Decimal,
    /// Approved orders allowed per rolling minute.
    pub max_orders_per_minute: u32,
    /// Size proposed by the strategy in fixed sizing mode.
    pub order_size_default: Volume,
    pub sizing: SizingMode,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_per_market: Decimal::from(100),
            max_global_exposure: Decimal::from(500),
            max_daily_loss: Decimal::from(50),
            max_orders_per_minute: 20,
            order_size_default: Decimal::from(10),
            sizing: SizingMode::Fixed,
        }
    }
}

/// Provisional exposure held between approval and fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub market_id: MarketId,
    pub side: Side,
    pub quantity: Volume,
    pub notional: Price,
}

/// What a committed fill did to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerUpdate {
    /// A new position was opened.
    Opened { position_id: PositionId },
    /// An existing position was added to.
    Increased { position_id: PositionId },
    /// A position was partly reduced and stays open.
    Reduced {
        position_id: PositionId,
        realized_pnl: Decimal,
    },
    /// A position was fully closed.
    Closed {
        position_id: PositionId,
        realized_pnl: Decimal,
        reason: Option<ExitReason>,
    },
    /// The fill referenced a position that is no longer open.
    Ignored,
}

/// Ledger contents guarded by the state lock.
pub struct Ledger {
    positions: HashMap<MarketId, Position>,
    closed: Vec<Position>,
    reservations: HashMap<ReservationId, Reservation>,
    realized_pnl_today: Decimal,
    trading_day: NaiveDate,
    seen_signals: HashSet<SignalId>,
    recent_orders: VecDeque<DateTime<Utc>>,
    next_position_id: u64,
}

impl Ledger {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            positions: HashMap::new(),
            closed: Vec::new(),
            reservations: HashMap::new(),
            realized_pnl_today: Decimal::ZERO,
            trading_day: now.date_naive(),
            seen_signals: HashSet::new(),
            recent_orders: VecDeque::new(),
            next_position_id: 1,
        }
    }

    /// Live (open or closing) position in a market.
    #[must_use]
    pub fn position(&self, market_id: &MarketId) -> Option<&Position> {
        self.positions.get(market_id)
    }

    /// Live position by id.
    #[must_use]
    pub fn position_by_id(&self, id: PositionId) -> Option<&Position> {
        self.positions.values().find(|p| p.id() == id)
    }

    /// Entry notional of all live positions.
    #[must_use]
    pub fn open_notional(&self) -> Price {
        self.positions.values().map(Position::notional).sum()
    }

    /// Notional held by outstanding reservations.
    #[must_use]
    pub fn reserved_notional(&self) -> Price {
        self.reservations.values().map(|r| r.notional).sum()
    }

    /// Quantity reserved in one market.
    #[must_use]
    pub fn reserved_quantity(&self, market_id: &MarketId) -> Volume {
        self.reservations
            .values()
            .filter(|r| &r.market_id == market_id)
            .map(|r| r.quantity)
            .sum()
    }

    /// Side of any outstanding reservation in a market.
    #[must_use]
    pub fn reserved_side(&self, market_id: &MarketId) -> Option<Side> {
        self.reservations
            .values()
            .find(|r| &r.market_id == market_id)
            .map(|r| r.side)
    }

    #[must_use]
    pub const fn realized_pnl_today(&self) -> Decimal {
        self.realized_pnl_today
    }

    #[must_use]
    pub fn has_seen(&self, id: SignalId) -> bool {
        self.seen_signals.contains(&id)
    }

    /// Orders approved within the minute before `now`.
    pub fn orders_in_last_minute(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - ChronoDuration::seconds(60);
        while self.recent_orders.front().is_some_and(|t| *t <= cutoff) {
            self.recent_orders.pop_front();
        }
        self.recent_orders.len()
    }

    /// Record an approval. Exposure-increasing approvals also reserve.
    pub(crate) fn record_approval(
        &mut self,
        signal: &Signal,
        now: DateTime<Utc>,
    ) -> Option<ReservationId> {
        self.seen_signals.insert(signal.id);
        self.recent_orders.push_back(now);
        if !signal.is_exposure_increasing() {
            return None;
        }
        let id = ReservationId::new();
        self.reservations.insert(
            id,
            Reservation {
                market_id: signal.market_id.clone(),
                side: signal.side,
                quantity: signal.size,
                notional: signal.notional(),
            },
        );
        Some(id)
    }

    fn allocate_position_id(&mut self) -> PositionId {
        let id = PositionId::new(self.next_position_id);
        self.next_position_id += 1;
        id
    }

    fn apply_fill(&mut self, fill: &Fill) -> LedgerUpdate {
        if let Some(id) = fill.reservation {
            self.reservations.remove(&id);
        }
        if fill.quantity <= Decimal::ZERO {
            return LedgerUpdate::Ignored;
        }

        match fill.intent {
            SignalIntent::Open => self.apply_open_fill(fill),
            SignalIntent::Close { position_id, reason } => {
                let matches = self
                    .positions
                    .get(&fill.market_id)
                    .is_some_and(|p| p.id() == position_id);
                if !matches {
                    warn!(
                        market_id = %fill.market_id,
                        position_id = %position_id,
                        "Closing fill for unknown position"
                    );
                    return LedgerUpdate::Ignored;
                }
                self.reduce_position(&fill.market_id, fill.quantity, fill.price, Some(reason))
            }
        }
    }

    fn apply_open_fill(&mut self, fill: &Fill) -> LedgerUpdate {
        let existing_side = self.positions.get(&fill.market_id).map(Position::side);
        match existing_side {
            Some(side) if side == fill.side => {
                let Some(position) = self.positions.get_mut(&fill.market_id) else {
                    return LedgerUpdate::Ignored;
                };
                position.add(fill.quantity, fill.price);
                LedgerUpdate::Increased {
                    position_id: position.id(),
                }
            }
            // Opposite-side entry fills net against the live position.
            Some(_) => self.reduce_position(&fill.market_id, fill.quantity, fill.price, None),
            None => {
                let id = self.allocate_position_id();
                let position = Position::open(
                    id,
                    fill.market_id.clone(),
                    fill.side,
                    fill.quantity,
                    fill.price,
                    fill.timestamp,
                    fill.protective,
                );
                self.positions.insert(fill.market_id.clone(), position);
                LedgerUpdate::Opened { position_id: id }
            }
        }
    }

    fn reduce_position(
        &mut self,
        market_id: &MarketId,
        quantity: Volume,
        price: Price,
        reason: Option<ExitReason>,
    ) -> LedgerUpdate {
        let Some(position) = self.positions.get_mut(market_id) else {
            return LedgerUpdate::Ignored;
        };
        let position_id = position.id();
        let realized_pnl = position.reduce(quantity, price);
        self.realized_pnl_today += realized_pnl;

        if position.status().is_closed() {
            if let Some(reason) = reason {
                position.set_exit_reason(reason);
            }
            if let Some(closed) = self.positions.remove(market_id) {
                self.closed.push(closed);
            }
            LedgerUpdate::Closed {
                position_id,
                realized_pnl,
                reason,
            }
        } else {
            // Partial close: let the monitor rescan the remainder.
            position.set_status(PositionStatus::Open);
            LedgerUpdate::Reduced {
                position_id,
                realized_pnl,
            }
        }
    }
}

/// Shared application state accessible by all services.
pub struct AppState {
    limits: RiskLimits,
    ledger: Mutex<Ledger>,
}

impl AppState {
    /// Create new app state with given risk limits.
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            ledger: Mutex::new(Ledger::new(Utc::now())),
        }
    }

    /// Get risk limits.
    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Take the ledger lock. Callers must not await while holding it.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock()
    }

    /// Commit a confirmed fill: convert its reservation and open, adjust
    /// or close the position.
    pub fn open_or_adjust(&self, fill: &Fill) -> LedgerUpdate {
        let update = self.ledger.lock().apply_fill(fill);
        debug!(
            market_id = %fill.market_id,
            side = %fill.side,
            quantity = %fill.quantity,
            price = %fill.price,
            update = ?update,
            "Fill committed"
        );
        update
    }

    /// Drop a reservation after a failed execution.
    pub fn release_reservation(&self, id: ReservationId) -> Option<Reservation> {
        let released = self.ledger.lock().reservations.remove(&id);
        if let Some(reservation) = &released {
            debug!(
                market_id = %reservation.market_id,
                notional = %reservation.notional,
                "Reservation released"
            );
        }
        released
    }

    /// Return a closing position to `Open` after its exit order failed, so
    /// the next scan retries it.
    pub fn abort_close(&self, position_id: PositionId) {
        let mut ledger = self.ledger.lock();
        if let Some(position) = ledger
            .positions
            .values_mut()
            .find(|p| p.id() == position_id)
        {
            if position.status() == PositionStatus::Closing {
                position.set_status(PositionStatus::Open);
            }
        }
    }

    /// Record the latest observed price for a market's position.
    pub fn mark_to_market(&self, market_id: &MarketId, price: Price) {
        if let Some(position) = self.ledger.lock().positions.get_mut(market_id) {
            position.set_mark(price);
        }
    }

    /// Closing signals for every open position whose protective exit has
    /// been reached. Those positions move to `Closing` so later scans skip
    /// them until the close resolves.
    pub fn scan_protective_exits(&self, now: DateTime<Utc>) -> Vec<Signal> {
        let mut ledger = self.ledger.lock();
        let mut signals = Vec::new();
        for position in ledger.positions.values_mut() {
            if position.status() != PositionStatus::Open {
                continue;
            }
            let Some(reason) = position.exit_trigger(now) else {
                continue;
            };
            position.set_status(PositionStatus::Closing);
            signals.push(Signal {
                id: SignalId::new(),
                origin_event: None,
                market_id: position.market_id().clone(),
                side: position.side().opposite(),
                size: position.quantity(),
                limit_price: position.mark_price().unwrap_or(position.entry_price()),
                min_size: Decimal::ZERO,
                protective: *position.protective(),
                intent: SignalIntent::Close {
                    position_id: position.id(),
                    reason,
                },
                created_at: now,
            });
        }
        signals
    }

    /// Explicitly reset the daily loss counter and start a new trading day.
    /// Returns the realized P&L of the day being closed.
    pub fn reset_daily(&self, now: DateTime<Utc>) -> Decimal {
        let mut ledger = self.ledger.lock();
        let previous = ledger.realized_pnl_today;
        ledger.realized_pnl_today = Decimal::ZERO;
        ledger.trading_day = now.date_naive();
        ledger.seen_signals.clear();
        ledger.closed.clear();
        info!(day = %ledger.trading_day, previous_pnl = %previous, "Daily counters reset");
        previous
    }

    /// Reset if `now` falls on a later UTC day than the current trading day.
    pub fn roll_trading_day(&self, now: DateTime<Utc>) -> Option<Decimal> {
        let due = self.ledger.lock().trading_day < now.date_naive();
        due.then(|| self.reset_daily(now))
    }

    /// Entry notional of all live positions.
    pub fn total_exposure(&self) -> Price {
        self.ledger.lock().open_notional()
    }

    /// Notional held by outstanding reservations.
    pub fn reserved_exposure(&self) -> Price {
        self.ledger.lock().reserved_notional()
    }

    /// Count outstanding reservations.
    pub fn reservation_count(&self) -> usize {
        self.ledger.lock().reservations.len()
    }

    /// Live position in a market, if any.
    pub fn position(&self, market_id: &MarketId) -> Option<Position> {
        self.ledger.lock().positions.get(market_id).cloned()
    }

    /// All live positions.
    pub fn open_positions(&self) -> Vec<Position> {
        self.ledger.lock().positions.values().cloned().collect()
    }

    /// Positions closed during the current trading day.
    pub fn closed_positions(&self) -> Vec<Position> {
        self.ledger.lock().closed.clone()
    }

    /// Realized P&L for the current trading day.
    pub fn daily_realized_pnl(&self) -> Decimal {
        self.ledger.lock().realized_pnl_today
    }

    pub fn trading_day(&self) -> NaiveDate {
        self.ledger.lock().trading_day
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RiskLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, ProtectiveParams};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn protective() -> ProtectiveParams {
        ProtectiveParams {
            take_profit_bps: 40,
            stop_loss_bps: 25,
            time_stop: Duration::from_secs(600),
        }
    }

    fn fill(side: Side, quantity: Decimal, price: Decimal, intent: SignalIntent) -> Fill {
        Fill {
            signal_id: SignalId::new(),
            order_id: OrderId::from("o-1"),
            market_id: MarketId::from("m1"),
            side,
            quantity,
            price,
            timestamp: Utc::now(),
            intent,
            protective: protective(),
            reservation: None,
        }
    }

    fn open_signal(size: Decimal, price: Decimal) -> Signal {
        Signal {
            id: SignalId::new(),
            origin_event: None,
            market_id: MarketId::from("m1"),
            side: Side::Buy,
            size,
            limit_price: price,
            min_size: dec!(1),
            protective: protective(),
            intent: SignalIntent::Open,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reservation_is_converted_on_fill() {
        let state = AppState::default();
        let signal = open_signal(dec!(10), dec!(0.50));
        let reservation = state.lock().record_approval(&signal, Utc::now());
        assert_eq!(state.reserved_exposure(), dec!(5.00));

        let mut fill = fill(Side::Buy, dec!(10), dec!(0.50), SignalIntent::Open);
        fill.reservation = reservation;
        let update = state.open_or_adjust(&fill);

        assert!(matches!(update, LedgerUpdate::Opened { .. }));
        assert_eq!(state.reserved_exposure(), Decimal::ZERO);
        assert_eq!(state.total_exposure(), dec!(5.00));
    }

    #[test]
    fn release_reservation_frees_headroom() {
        let state = AppState::default();
        let signal = open_signal(dec!(10), dec!(0.50));
        let id = state.lock().record_approval(&signal, Utc::now()).unwrap();

        assert!(state.release_reservation(id).is_some());
        assert!(state.release_reservation(id).is_none());
        assert_eq!(state.reservation_count(), 0);
    }

    #[test]
    fn same_side_fill_adds_to_position() {
        let state = AppState::default();
        state.open_or_adjust(&fill(Side::Buy, dec!(10), dec!(0.40), SignalIntent::Open));
        let update = state.open_or_adjust(&fill(Side::Buy, dec!(10), dec!(0.60), SignalIntent::Open));

        assert!(matches!(update, LedgerUpdate::Increased { .. }));
        let position = state.position(&MarketId::from("m1")).unwrap();
        assert_eq!(position.quantity(), dec!(20));
        assert_eq!(position.entry_price(), dec!(0.50));
    }

    #[test]
    fn closing_fill_realizes_loss() {
        let state = AppState::default();
        state.open_or_adjust(&fill(Side::Buy, dec!(100), dec!(0.50), SignalIntent::Open));
        let position_id = state.position(&MarketId::from("m1")).unwrap().id();

        let update = state.open_or_adjust(&fill(
            Side::Sell,
            dec!(100),
            dec!(0.45),
            SignalIntent::Close {
                position_id,
                reason: ExitReason::StopLoss,
            },
        ));

        assert!(matches!(
            update,
            LedgerUpdate::Closed {
                reason: Some(ExitReason::StopLoss),
                ..
            }
        ));
        assert_eq!(state.daily_realized_pnl(), dec!(-5.00));
        assert!(state.position(&MarketId::from("m1")).is_none());
        assert_eq!(state.closed_positions().len(), 1);
    }

    #[test]
    fn scan_marks_position_closing_once() {
        let state = AppState::default();
        state.open_or_adjust(&fill(Side::Buy, dec!(10), dec!(0.50), SignalIntent::Open));
        state.mark_to_market(&MarketId::from("m1"), dec!(0.49));

        let now = Utc::now();
        let first = state.scan_protective_exits(now);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].side, Side::Sell);
        assert_eq!(first[0].size, dec!(10));
        assert!(state.scan_protective_exits(now).is_empty());

        let SignalIntent::Close { position_id, .. } = first[0].intent else {
            panic!("expected closing signal");
        };
        state.abort_close(position_id);
        assert_eq!(state.scan_protective_exits(now).len(), 1);
    }

    #[test]
    fn roll_trading_day_only_on_new_day() {
        let state = AppState::default();
        let today = Utc::now();
        assert!(state.roll_trading_day(today).is_none());
        let tomorrow = today + ChronoDuration::days(1);
        assert_eq!(state.roll_trading_day(tomorrow), Some(Decimal::ZERO));
        assert_eq!(state.trading_day(), tomorrow.date_naive());
    }

    #[test]
    fn rate_window_forgets_old_orders() {
        let state = AppState::default();
        let start = Utc::now();
        let mut ledger = state.lock();
        ledger.record_approval(&open_signal(dec!(1), dec!(0.5)), start);
        ledger.record_approval(&open_signal(dec!(1), dec!(0.5)), start);
        assert_eq!(ledger.orders_in_last_minute(start), 2);
        assert_eq!(ledger.orders_in_last_minute(start + ChronoDuration::seconds(61)), 0);
    }
}
