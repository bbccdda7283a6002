//! Simulated venue for paper trading.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::domain::{OrderId, SignedOrder};
use crate::error::VenueError;
use crate::port::outbound::venue::{OrderVenue, VenueAck};

/// Fills every order immediately and in full at its limit price.
///
/// Used in simulation mode so the whole pipeline, signing included, runs
/// without touching the real venue.
#[derive(Debug, Default)]
pub struct PaperVenue {
    placed: AtomicU64,
}

impl PaperVenue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders placed so far.
    #[must_use]
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderVenue for PaperVenue {
    async fn place_order(&self, order: &SignedOrder) -> Result<VenueAck, VenueError> {
        let seq = self.placed.fetch_add(1, Ordering::Relaxed) + 1;
        let request = order.order();
        let short = request.client_order_id.to_string();
        let order_id = OrderId::new(format!("sim-{seq}-{}", &short[..8.min(short.len())]));

        info!(
            market_id = %request.market_id,
            side = %request.side,
            size = %request.size,
            price = %request.price,
            order_id = %order_id,
            "Simulated order filled"
        );

        Ok(VenueAck {
            order_id,
            filled_size: request.size,
            average_price: request.price,
            status: "simulated".to_string(),
        })
    }

    fn venue_name(&self) -> &'static str {
        "paper"
    }
}
