//! Order signing port.

use async_trait::async_trait;

use crate::domain::{OrderRequest, OrderSignature};
use crate::error::SigningError;

/// Produces a signature over an order's canonical payload.
///
/// Backends are interchangeable: nothing downstream may depend on which
/// one is active. A missing key or unreachable signer is a
/// [`SigningError`], never a panic.
#[async_trait]
pub trait OrderSigner: Send + Sync {
    /// Sign the order's canonical payload.
    async fn sign(&self, order: &OrderRequest) -> Result<OrderSignature, SigningError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}
