//! Venue order payloads, their signed form, and confirmed fills.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OrderId, ReservationId, SignalId};
use super::money::{Price, Volume};
use super::signal::{ProtectiveParams, Side, Signal, SignalIntent};
use crate::error::SigningError;

/// Order type sent to the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
}

/// Unsigned order payload.
///
/// `client_order_id` is the id of the signal the order came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: SignalId,
    pub market_id: MarketId,
    pub side: Side,
    pub price: Price,
    pub size: Volume,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
}

impl OrderRequest {
    /// Build the limit order for an approved signal.
    #[must_use]
    pub fn from_signal(signal: &Signal, now: DateTime<Utc>) -> Self {
        Self {
            client_order_id: signal.id,
            market_id: signal.market_id.clone(),
            side: signal.side,
            price: signal.limit_price,
            size: signal.size,
            order_type: OrderType::Limit,
            created_at: now,
        }
    }

    /// Canonical bytes covered by the signature.
    ///
    /// Compact JSON with fields in declaration order.
    pub fn signing_payload(&self) -> Result<Vec<u8>, SigningError> {
        serde_json::to_vec(self).map_err(|e| SigningError::Payload(e.to_string()))
    }
}

/// Signature plus the identity it verifies against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignature {
    /// Hex-encoded signature.
    pub signature: String,
    /// Signer identity (checksummed address).
    pub public_key: String,
}

/// An order ready to leave the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    order: OrderRequest,
    signature: OrderSignature,
}

impl SignedOrder {
    #[must_use]
    pub const fn new(order: OrderRequest, signature: OrderSignature) -> Self {
        Self { order, signature }
    }

    #[must_use]
    pub const fn order(&self) -> &OrderRequest {
        &self.order
    }

    #[must_use]
    pub const fn signature(&self) -> &OrderSignature {
        &self.signature
    }
}

/// A confirmed fill handed to the position ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub signal_id: SignalId,
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub side: Side,
    pub quantity: Volume,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
    pub intent: SignalIntent,
    pub protective: ProtectiveParams,
    /// Exposure reservation to convert into a committed position.
    pub reservation: Option<ReservationId>,
}
