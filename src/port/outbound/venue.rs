//! Order venue port.

use async_trait::async_trait;

use crate::domain::{OrderId, Price, SignedOrder, Volume};
use crate::error::VenueError;

/// Venue acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueAck {
    /// Venue-assigned order id.
    pub order_id: OrderId,
    /// Quantity confirmed filled.
    pub filled_size: Volume,
    /// Average fill price.
    pub average_price: Price,
    /// Raw venue status string, for logs.
    pub status: String,
}

/// Places signed orders on the trading venue.
#[async_trait]
pub trait OrderVenue: Send + Sync {
    /// Submit one order. Implementations classify failures as transient
    /// (retryable) or rejected (final) via [`VenueError`].
    async fn place_order(&self, order: &SignedOrder) -> Result<VenueAck, VenueError>;

    /// Venue name for logging.
    fn venue_name(&self) -> &'static str;
}
