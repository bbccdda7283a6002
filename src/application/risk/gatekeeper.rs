//! Risk gatekeeper.
//!
//! Validates candidate signals against the kill switch, the daily loss limit,
//! the per-market and global caps and the order-rate limit. On approval it
//! reserves the exposure in the same critical section as the checks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::application::state::{AppState, Ledger, RiskLimits};
use crate::domain::money::floor_size;
use crate::domain::{PositionId, Signal, SignalIntent, Volume};
use crate::port::inbound::risk::{Approval, RejectReason, RiskDecision};
use crate::port::outbound::kill_switch::KillSwitch;

/// Gatekeeper that validates signals before execution.
///
/// Check order for entries, first failure wins:
/// - kill switch
/// - duplicate signal id
/// - daily loss limit
/// - per-market cap (resize, or reject when no headroom)
/// - global exposure cap (resize, or reject when no headroom)
/// - order rate
///
/// Closing signals reduce risk and skip every check except the duplicate
/// check and the existence of the position they close.
pub struct RiskGatekeeper {
    state: Arc<AppState>,
    kill_switch: Arc<dyn KillSwitch>,
}

impl RiskGatekeeper {
    pub fn new(state: Arc<AppState>, kill_switch: Arc<dyn KillSwitch>) -> Self {
        Self { state, kill_switch }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Check a signal at the current time.
    #[must_use]
    pub fn check(&self, signal: Signal) -> RiskDecision {
        self.check_at(signal, Utc::now())
    }

    /// Check a signal, using `now` for the order-rate window.
    #[must_use]
    pub fn check_at(&self, signal: Signal, now: DateTime<Utc>) -> RiskDecision {
        // Read before taking the lock; never cached between calls.
        let halted = self.kill_switch.is_active();
        let limits = self.state.limits();
        let mut ledger = self.state.lock();

        let decision = match signal.intent {
            SignalIntent::Close { position_id, .. } => {
                check_close(&mut ledger, signal, position_id, now)
            }
            SignalIntent::Open => {
                check_open(&mut ledger, limits, signal, halted, now)
            }
        };
        drop(ledger);

        match &decision {
            RiskDecision::Approved(approval) => {
                info!(
                    market_id = %approval.signal.market_id,
                    side = %approval.signal.side,
                    size = %approval.signal.size,
                    requested = %approval.requested_size,
                    closing = !approval.signal.is_exposure_increasing(),
                    "Signal approved"
                );
            }
            RiskDecision::Rejected { signal, reason } => {
                warn!(
                    market_id = %signal.market_id,
                    side = %signal.side,
                    size = %signal.size,
                    reason = %reason,
                    "Signal rejected"
                );
            }
        }
        decision
    }
}

fn reject(signal: Signal, reason: RejectReason) -> RiskDecision {
    RiskDecision::Rejected { signal, reason }
}

fn check_open(
    ledger: &mut Ledger,
    limits: &RiskLimits,
    signal: Signal,
    halted: bool,
    now: DateTime<Utc>,
) -> RiskDecision {
    if halted {
        return reject(signal, RejectReason::Halted);
    }
    if ledger.has_seen(signal.id) {
        return reject(signal, RejectReason::Duplicate);
    }
    if ledger.realized_pnl_today() <= -limits.max_daily_loss {
        return reject(signal, RejectReason::DailyLossLimit);
    }

    let requested = signal.size;

    // One directional position per market.
    let held = match ledger.position(&signal.market_id) {
        Some(position) if position.side() != signal.side => {
            return reject(signal, RejectReason::PositionCap);
        }
        Some(position) => position.quantity(),
        None => Decimal::ZERO,
    };
    if ledger
        .reserved_side(&signal.market_id)
        .is_some_and(|side| side != signal.side)
    {
        return reject(signal, RejectReason::PositionCap);
    }
    let market_headroom =
        limits.max_position_per_market - held - ledger.reserved_quantity(&signal.market_id);
    let Some(size) = clamp(requested, market_headroom, signal.min_size) else {
        debug!(market_id = %signal.market_id, headroom = %market_headroom, "No market headroom");
        return reject(signal, RejectReason::PositionCap);
    };

    let exposure_headroom =
        limits.max_global_exposure - ledger.open_notional() - ledger.reserved_notional();
    let exposure_room = if signal.limit_price > Decimal::ZERO && exposure_headroom > Decimal::ZERO
    {
        floor_size(exposure_headroom / signal.limit_price)
    } else {
        Decimal::ZERO
    };
    let Some(size) = clamp(size, exposure_room, signal.min_size) else {
        debug!(market_id = %signal.market_id, headroom = %exposure_headroom, "No exposure headroom");
        return reject(signal, RejectReason::ExposureCap);
    };

    let max_orders = usize::try_from(limits.max_orders_per_minute).unwrap_or(usize::MAX);
    if ledger.orders_in_last_minute(now) >= max_orders {
        return reject(signal, RejectReason::RateLimited);
    }

    let signal = if size == requested {
        signal
    } else {
        signal.with_size(size)
    };
    let reservation = ledger.record_approval(&signal, now);
    RiskDecision::Approved(Approval {
        signal,
        requested_size: requested,
        reservation,
    })
}

fn check_close(
    ledger: &mut Ledger,
    signal: Signal,
    position_id: PositionId,
    now: DateTime<Utc>,
) -> RiskDecision {
    if ledger.has_seen(signal.id) {
        return reject(signal, RejectReason::Duplicate);
    }
    let open = match ledger.position_by_id(position_id) {
        Some(position) if position.market_id() == &signal.market_id => position.quantity(),
        _ => return reject(signal, RejectReason::NoPosition),
    };
    if open <= Decimal::ZERO {
        return reject(signal, RejectReason::NoPosition);
    }

    let requested = signal.size;
    let signal = if requested > open {
        signal.with_size(open)
    } else {
        signal
    };
    let reservation = ledger.record_approval(&signal, now);
    RiskDecision::Approved(Approval {
        signal,
        requested_size: requested,
        reservation,
    })
}

/// Shrink `requested` to `headroom` at 2 dp. `None` when nothing tradable
/// remains. Never grows the request.
fn clamp(requested: Volume, headroom: Volume, min_size: Volume) -> Option<Volume> {
    let size = floor_size(requested.min(headroom));
    (size > Decimal::ZERO && size >= min_size).then_some(size)
}
