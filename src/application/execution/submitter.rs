//! Execution submitter.
//!
//! Turns an approval into a signed order on the venue and settles the ledger
//! afterwards: commit on fill, release on failure. The ledger lock is never
//! held across the signing or venue calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::retry::{RetryError, RetryPolicy};
use crate::application::state::{AppState, LedgerUpdate};
use crate::domain::{Fill, OrderRequest, ReservationId, Signal, SignalIntent, SignedOrder};
use crate::error::{ExecutionFailure, VenueError};
use crate::port::inbound::risk::Approval;
use crate::port::outbound::kill_switch::KillSwitch;
use crate::port::outbound::notifier::{
    CloseEvent, Event, ExecutionEvent, FailureEvent, NotifierRegistry,
};
use crate::port::outbound::signer::OrderSigner;
use crate::port::outbound::venue::{OrderVenue, VenueAck};

/// Signs, submits and settles approved signals.
pub struct ExecutionSubmitter {
    state: Arc<AppState>,
    signer: Arc<dyn OrderSigner>,
    venue: Arc<dyn OrderVenue>,
    kill_switch: Arc<dyn KillSwitch>,
    notifiers: Arc<NotifierRegistry>,
    retry: RetryPolicy,
    closed: AtomicBool,
}

impl ExecutionSubmitter {
    pub fn new(
        state: Arc<AppState>,
        signer: Arc<dyn OrderSigner>,
        venue: Arc<dyn OrderVenue>,
        kill_switch: Arc<dyn KillSwitch>,
        notifiers: Arc<NotifierRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            state,
            signer,
            venue,
            kill_switch,
            notifiers,
            retry,
            closed: AtomicBool::new(false),
        }
    }

    /// Stop admitting new approvals. Executions already running finish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Execute an approval end to end.
    ///
    /// Every failure path releases the approval's reservation, returns a
    /// closing position to `Open` for the next scan, and alerts.
    pub async fn execute(&self, approval: Approval) -> Result<Fill, ExecutionFailure> {
        let Approval {
            signal,
            reservation,
            ..
        } = approval;

        let result = if self.is_closed() {
            Err(ExecutionFailure::ShuttingDown)
        } else {
            self.submit(&signal).await
        };

        match result {
            Ok(ack) if ack.filled_size > Decimal::ZERO => {
                let fill = Fill {
                    signal_id: signal.id,
                    order_id: ack.order_id,
                    market_id: signal.market_id.clone(),
                    side: signal.side,
                    quantity: ack.filled_size.min(signal.size),
                    price: ack.average_price,
                    timestamp: Utc::now(),
                    intent: signal.intent,
                    protective: signal.protective,
                    reservation,
                };
                self.commit(&fill);
                Ok(fill)
            }
            Ok(ack) => {
                let failure = ExecutionFailure::Rejected(format!(
                    "order {} accepted without fill (status {})",
                    ack.order_id, ack.status
                ));
                self.fail(&signal, reservation, &failure);
                Err(failure)
            }
            Err(failure) => {
                self.fail(&signal, reservation, &failure);
                Err(failure)
            }
        }
    }

    /// Sign the order and place it with bounded retry.
    async fn submit(&self, signal: &Signal) -> Result<VenueAck, ExecutionFailure> {
        let order = OrderRequest::from_signal(signal, Utc::now());
        let signature = self.signer.sign(&order).await?;
        debug!(
            market_id = %signal.market_id,
            backend = self.signer.backend_name(),
            "Order signed"
        );
        let signed = SignedOrder::new(order, signature);

        // Last look before the order leaves the process.
        if signal.is_exposure_increasing() && self.kill_switch.is_active() {
            return Err(ExecutionFailure::Halted);
        }

        let venue = self.venue.as_ref();
        let signed = &signed;
        self.retry
            .run(
                move |attempt| async move {
                    debug!(attempt, venue = venue.venue_name(), "Placing order");
                    venue.place_order(signed).await
                },
                VenueError::is_transient,
            )
            .await
            .map_err(|err| match err {
                RetryError::Fatal { error, .. } => ExecutionFailure::Rejected(error.message),
                RetryError::Exhausted { attempts, last } => ExecutionFailure::RetriesExhausted {
                    attempts,
                    last_error: last.message,
                },
                RetryError::DeadlineExceeded { .. } => ExecutionFailure::DeadlineExceeded {
                    deadline_ms: u64::try_from(self.retry.deadline.as_millis()).unwrap_or(u64::MAX),
                },
            })
    }

    fn commit(&self, fill: &Fill) {
        let update = self.state.open_or_adjust(fill);
        info!(
            market_id = %fill.market_id,
            order_id = %fill.order_id,
            side = %fill.side,
            quantity = %fill.quantity,
            price = %fill.price,
            "Order filled"
        );
        self.notifiers
            .notify_all(Event::OrderFilled(ExecutionEvent::from(fill)));

        if let LedgerUpdate::Closed {
            position_id,
            realized_pnl,
            reason: Some(reason),
        } = update
        {
            self.notifiers.notify_all(Event::PositionClosed(CloseEvent {
                market_id: fill.market_id.to_string(),
                position_id: position_id.to_string(),
                reason,
                realized_pnl,
            }));
        }
    }

    fn fail(
        &self,
        signal: &Signal,
        reservation: Option<ReservationId>,
        failure: &ExecutionFailure,
    ) {
        if let Some(id) = reservation {
            self.state.release_reservation(id);
        }
        if let SignalIntent::Close { position_id, .. } = signal.intent {
            self.state.abort_close(position_id);
        }

        match failure {
            ExecutionFailure::Halted | ExecutionFailure::ShuttingDown => {
                warn!(market_id = %signal.market_id, reason = %failure, "Order not submitted");
            }
            _ => {
                error!(market_id = %signal.market_id, error = %failure, "Execution failed");
            }
        }
        self.notifiers
            .notify_all(Event::ExecutionFailed(FailureEvent {
                market_id: signal.market_id.to_string(),
                side: signal.side,
                size: signal.size,
                reason: failure.to_string(),
            }));
    }
}
