//! Remote signing backend.
//!
//! Posts `{"payload": <order>}` to an external signing service and expects
//! `{"signature": string, "public_key": string}` back. Any other shape or a
//! non-success status is a signing failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::domain::{OrderRequest, OrderSignature};
use crate::error::SigningError;
use crate::port::outbound::signer::OrderSigner;

#[derive(Serialize)]
struct SignRequest<'a> {
    payload: &'a OrderRequest,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    public_key: Option<String>,
}

/// Delegates signing to an external service over HTTP.
pub struct RemoteSigner {
    http: HttpClient,
    url: Url,
}

impl RemoteSigner {
    /// Create a signer for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SigningError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SigningError::Unreachable(e.to_string()))?;
        Ok(Self { http, url })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

fn transport_error(err: &reqwest::Error) -> SigningError {
    if err.is_timeout() {
        SigningError::Timeout
    } else {
        SigningError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl OrderSigner for RemoteSigner {
    async fn sign(&self, order: &OrderRequest) -> Result<OrderSignature, SigningError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&SignRequest { payload: order })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SigningError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body: SignResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SigningError::Timeout
            } else {
                SigningError::MalformedResponse(e.to_string())
            }
        })?;

        match (body.signature, body.public_key) {
            (Some(signature), Some(public_key))
                if !signature.is_empty() && !public_key.is_empty() =>
            {
                debug!(url = %self.url, "Remote signature received");
                Ok(OrderSignature {
                    signature,
                    public_key,
                })
            }
            _ => Err(SigningError::MalformedResponse(
                "response missing signature/public_key".to_string(),
            )),
        }
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
