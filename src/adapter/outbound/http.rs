//! Shared HTTP plumbing for the REST feed and venue.

use std::fmt;
use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder};
use tracing::warn;

/// Venue API credentials, read from the environment at startup.
#[derive(Clone, Default)]
pub struct ApiCredentials {
    pub api_key: Option<String>,
    pub api_passphrase: Option<String>,
}

impl ApiCredentials {
    /// Attach the `X-API-*` headers present in these credentials.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }
        if let Some(passphrase) = &self.api_passphrase {
            request = request.header("X-API-PASSPHRASE", passphrase);
        }
        request
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "api_passphrase",
                &self.api_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Build a client with request and connect timeouts.
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn client_with_timeouts(timeout: Duration, connect_timeout: Duration) -> HttpClient {
    HttpClient::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            HttpClient::new()
        })
}

/// Join a base URL and a path without doubling slashes.
#[must_use]
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
