//! Live order placement over the venue's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, info};

use super::dto::OrderResponse;
use crate::adapter::outbound::http::{client_with_timeouts, endpoint, ApiCredentials};
use crate::domain::SignedOrder;
use crate::error::VenueError;
use crate::port::outbound::venue::{OrderVenue, VenueAck};

/// Places signed orders with `POST {api_url}/orders`.
///
/// The body is the order's signing payload byte for byte, so the venue can
/// verify the signature against exactly what it received. The signature
/// travels in the `X-WALLET-SIGNATURE` and
/// `X-WALLET-PUBLIC-KEY` headers. Timeouts, connection failures and 5xx
/// responses are transient; any other non-success status is a rejection.
pub struct RestVenue {
    http: HttpClient,
    api_url: String,
    credentials: ApiCredentials,
}

impl RestVenue {
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        credentials: ApiCredentials,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            http: client_with_timeouts(timeout, connect_timeout),
            api_url: api_url.into(),
            credentials,
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> VenueError {
        let message = format!("status {}: {}", status.as_u16(), truncate(body, 200));
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            VenueError::transient(message)
        } else {
            VenueError::rejected(message)
        }
    }

    fn classify_transport(err: &reqwest::Error) -> VenueError {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            VenueError::transient(err.to_string())
        } else {
            VenueError::rejected(err.to_string())
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl OrderVenue for RestVenue {
    async fn place_order(&self, order: &SignedOrder) -> Result<VenueAck, VenueError> {
        let url = endpoint(&self.api_url, "orders");
        let body = order
            .order()
            .signing_payload()
            .map_err(|e| VenueError::rejected(format!("unencodable order: {e}")))?;
        let request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("X-WALLET-SIGNATURE", &order.signature().signature)
            .header("X-WALLET-PUBLIC-KEY", &order.signature().public_key)
            .body(body);

        let response = self
            .credentials
            .apply(request)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&e))?;
        let parsed: OrderResponse = if text.trim().is_empty() {
            serde_json::from_str("{}")
        } else {
            serde_json::from_str(&text)
        }
        .map_err(|e| VenueError::rejected(format!("unreadable order response: {e}")))?;

        let ack = parsed.into_ack(order);
        debug!(order_id = %ack.order_id, status = %ack.status, "Venue acknowledged order");
        info!(
            market_id = %order.order().market_id,
            side = %order.order().side,
            size = %order.order().size,
            price = %order.order().price,
            order_id = %ack.order_id,
            "Order submitted"
        );
        Ok(ack)
    }

    fn venue_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VenueErrorKind;
    use crate::testkit::domain::signed_order;
    use crate::testkit::http::StubServer;

    fn venue(url: &str) -> RestVenue {
        RestVenue::new(
            url,
            ApiCredentials {
                api_key: Some("k".into()),
                api_passphrase: Some("p".into()),
            },
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn accepted_order_is_acknowledged() {
        let server = StubServer::respond(200, r#"{"order_id":"v-9","status":"matched"}"#).await;
        let signed = signed_order();

        let ack = venue(&server.url()).place_order(&signed).await.unwrap();

        assert_eq!(ack.order_id.as_str(), "v-9");
        assert_eq!(ack.filled_size, signed.order().size);
        let head = server.last_head().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("post /orders"));
        assert!(head.contains("x-wallet-signature"));
        assert!(head.contains("x-api-key: k"));
    }

    #[tokio::test]
    async fn body_is_the_signed_payload() {
        let server = StubServer::respond(200, r#"{"order_id":"v-1"}"#).await;
        let signed = signed_order();

        venue(&server.url()).place_order(&signed).await.unwrap();

        let payload = signed.order().signing_payload().unwrap();
        assert_eq!(server.last_body().unwrap().as_bytes(), payload.as_slice());
        let head = server.last_head().unwrap().to_ascii_lowercase();
        assert!(head.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = StubServer::respond(502, "bad gateway").await;
        let err = venue(&server.url())
            .place_order(&signed_order())
            .await
            .unwrap_err();
        assert_eq!(err.kind, VenueErrorKind::Transient);
    }

    #[tokio::test]
    async fn client_error_is_rejection() {
        let server = StubServer::respond(400, r#"{"error":"bad tick"}"#).await;
        let err = venue(&server.url())
            .place_order(&signed_order())
            .await
            .unwrap_err();
        assert_eq!(err.kind, VenueErrorKind::Rejected);
        assert!(err.message.contains("bad tick"));
    }

    #[tokio::test]
    async fn timeout_is_transient() {
        let server = StubServer::silent().await;
        let err = venue(&server.url())
            .place_order(&signed_order())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
