//! Protective-exit monitor.
//!
//! Periodically scans open positions for take-profit, stop-loss and
//! time-stop triggers and feeds the resulting closing signals through the
//! same gatekeeper and execution path as entries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::context::PipelineContext;
use crate::domain::SignalIntent;
use crate::port::inbound::risk::{Approval, RiskDecision};
use crate::port::outbound::notifier::{DecisionEvent, Event, RiskEvent};

/// Scans the ledger for protective exits.
pub struct ProtectiveExitMonitor {
    context: PipelineContext,
}

impl ProtectiveExitMonitor {
    #[must_use]
    pub const fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    /// One scan at `now`: roll the trading day if due, then gate every
    /// triggered exit. Returns the approved closing orders.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<Approval> {
        let state = &self.context.state;
        if let Some(previous) = state.roll_trading_day(now) {
            self.context.notifiers.notify_all(Event::DailyReset {
                date: now.date_naive(),
                realized_pnl: previous,
            });
        }

        let mut approvals = Vec::new();
        for signal in state.scan_protective_exits(now) {
            if let SignalIntent::Close { position_id, reason } = signal.intent {
                info!(
                    market_id = %signal.market_id,
                    position_id = %position_id,
                    reason = %reason,
                    size = %signal.size,
                    "Protective exit triggered"
                );
            }
            match self.context.gatekeeper.check_at(signal, now) {
                RiskDecision::Approved(approval) => {
                    self.context
                        .notifiers
                        .notify_all(Event::SignalApproved(DecisionEvent::from(&approval)));
                    approvals.push(approval);
                }
                RiskDecision::Rejected { signal, reason } => {
                    if let SignalIntent::Close { position_id, .. } = signal.intent {
                        state.abort_close(position_id);
                    }
                    self.context
                        .notifiers
                        .notify_all(Event::SignalRejected(RiskEvent::new(&signal, reason)));
                }
            }
        }
        approvals
    }

    /// Scan every `interval` until shutdown.
    pub async fn run(
        self,
        interval: Duration,
        approvals: mpsc::UnboundedSender<Approval>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown.borrow() {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    for approval in self.tick(Utc::now()) {
                        if let Err(err) = approvals.send(approval) {
                            warn!(market_id = %err.0.signal.market_id, "Dispatcher closed, exit not submitted");
                            if let SignalIntent::Close { position_id, .. } = err.0.signal.intent {
                                self.context.state.abort_close(position_id);
                            }
                        }
                    }
                }
            }
        }
        info!("Protective-exit monitor stopped");
    }
}

