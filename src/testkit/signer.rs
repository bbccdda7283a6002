//! Signer doubles.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::domain::{OrderRequest, OrderSignature};
use crate::error::SigningError;
use crate::port::outbound::signer::OrderSigner;

/// Returns the same placeholder signature for every order.
#[derive(Debug, Default)]
pub struct StaticSigner {
    calls: AtomicU32,
}

impl StaticSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderSigner for StaticSigner {
    async fn sign(&self, _order: &OrderRequest) -> Result<OrderSignature, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OrderSignature {
            signature: "0xstatic".to_string(),
            public_key: "0xstatic-key".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}

/// Fails every call with the configured error.
#[derive(Debug)]
pub struct FailingSigner {
    error: SigningError,
}

impl FailingSigner {
    pub fn new(error: SigningError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl OrderSigner for FailingSigner {
    async fn sign(&self, _order: &OrderRequest) -> Result<OrderSignature, SigningError> {
        Err(self.error.clone())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
