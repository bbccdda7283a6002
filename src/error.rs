use thiserror::Error;

use crate::domain::MarketId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Problems with an incoming market snapshot.
///
/// A feed error drops the offending snapshot only; the market's pipeline
/// keeps running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("snapshot for {market_id} is missing field {field}")]
    MissingField {
        market_id: MarketId,
        field: &'static str,
    },

    #[error("snapshot for {market_id} has malformed {field}: {reason}")]
    Malformed {
        market_id: MarketId,
        field: &'static str,
        reason: String,
    },

    #[error("snapshot for {market_id} is out of order: {reason}")]
    OutOfOrder { market_id: MarketId, reason: String },

    #[error("feed transport error for {market_id}: {reason}")]
    Transport { market_id: MarketId, reason: String },
}

impl FeedError {
    /// Market the failed snapshot belonged to.
    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        match self {
            Self::MissingField { market_id, .. }
            | Self::Malformed { market_id, .. }
            | Self::OutOfOrder { market_id, .. }
            | Self::Transport { market_id, .. } => market_id,
        }
    }
}

/// Order signing failures. Always scoped to a single order attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("failed to encode order payload: {0}")]
    Payload(String),

    #[error("remote signer timed out")]
    Timeout,

    #[error("remote signer unreachable: {0}")]
    Unreachable(String),

    #[error("remote signer returned status {status}")]
    BadStatus { status: u16 },

    #[error("malformed signer response: {0}")]
    MalformedResponse(String),

    #[error("signature verification failed: {0}")]
    Verification(String),
}

/// Whether a venue failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueErrorKind {
    /// Network error, timeout or venue-side 5xx.
    Transient,
    /// The venue refused the order itself.
    Rejected,
}

/// Failure reported by an order venue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?} venue error: {message}")]
pub struct VenueError {
    pub kind: VenueErrorKind,
    pub message: String,
}

impl VenueError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: VenueErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: VenueErrorKind::Rejected,
            message: message.into(),
        }
    }

    /// Retry classifier: only transient failures are retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, VenueErrorKind::Transient)
    }
}

/// Terminal outcome of a failed execution attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionFailure {
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("order deadline of {deadline_ms}ms exceeded")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("kill switch became active before submission")]
    Halted,

    #[error("engine is shutting down")]
    ShuttingDown,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
