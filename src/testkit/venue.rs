//! Scripted [`OrderVenue`] for execution tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{OrderId, SignedOrder, Volume};
use crate::error::VenueError;
use crate::port::outbound::venue::{OrderVenue, VenueAck};

/// What the venue does with the next order.
#[derive(Debug, Clone)]
pub enum VenueOutcome {
    /// Fill in full at the limit price.
    Fill,
    /// Fill only this quantity at the limit price.
    Partial(Volume),
    /// Accept without filling anything.
    Unfilled,
    /// Fail with this error.
    Fail(VenueError),
}

/// Plays queued outcomes in order, then fills everything in full.
#[derive(Default)]
pub struct ScriptedVenue {
    outcomes: Mutex<VecDeque<VenueOutcome>>,
    latency: Option<Duration>,
    orders: Mutex<Vec<SignedOrder>>,
    calls: AtomicU32,
}

impl ScriptedVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = VenueOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `place_order` calls, failed ones included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every order the venue was asked to place.
    pub fn orders(&self) -> Vec<SignedOrder> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl OrderVenue for ScriptedVenue {
    async fn place_order(&self, order: &SignedOrder) -> Result<VenueAck, VenueError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.orders.lock().push(order.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(VenueOutcome::Fill);
        let request = order.order();
        let ack = |filled_size: Volume, status: &str| VenueAck {
            order_id: OrderId::new(format!("scripted-{call}")),
            filled_size,
            average_price: request.price,
            status: status.to_string(),
        };
        match outcome {
            VenueOutcome::Fill => Ok(ack(request.size, "matched")),
            VenueOutcome::Partial(size) => Ok(ack(size.min(request.size), "partial")),
            VenueOutcome::Unfilled => Ok(ack(Decimal::ZERO, "live")),
            VenueOutcome::Fail(error) => Err(error),
        }
    }

    fn venue_name(&self) -> &'static str {
        "scripted"
    }
}
