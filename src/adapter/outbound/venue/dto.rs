//! Venue order response types.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{OrderId, SignedOrder};
use crate::port::outbound::venue::VenueAck;

/// Venue response to an order placement.
///
/// Fill fields are optional; an accepted order without them is treated as
/// filled in full at its limit price.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filled_size: Option<Decimal>,
    #[serde(default)]
    pub average_price: Option<Decimal>,
}

impl OrderResponse {
    /// Convert into an acknowledgement for `signed`.
    #[must_use]
    pub fn into_ack(self, signed: &SignedOrder) -> VenueAck {
        let order = signed.order();
        VenueAck {
            order_id: OrderId::new(
                self.order_id
                    .unwrap_or_else(|| order.client_order_id.to_string()),
            ),
            filled_size: self.filled_size.unwrap_or(order.size),
            average_price: self.average_price.unwrap_or(order.price),
            status: self.status.unwrap_or_else(|| "submitted".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::signed_order;
    use rust_decimal_macros::dec;

    #[test]
    fn bare_ack_fills_at_limit() {
        let signed = signed_order();
        let response: OrderResponse = serde_json::from_str(r#"{"order_id":"v-1"}"#).unwrap();
        let ack = response.into_ack(&signed);
        assert_eq!(ack.order_id.as_str(), "v-1");
        assert_eq!(ack.filled_size, signed.order().size);
        assert_eq!(ack.average_price, signed.order().price);
        assert_eq!(ack.status, "submitted");
    }

    #[test]
    fn explicit_fill_fields_are_used() {
        let signed = signed_order();
        let response: OrderResponse = serde_json::from_str(
            r#"{"order_id":"v-2","status":"partial","filled_size":4,"average_price":0.6}"#,
        )
        .unwrap();
        let ack = response.into_ack(&signed);
        assert_eq!(ack.filled_size, dec!(4));
        assert_eq!(ack.average_price, dec!(0.6));
    }
}
