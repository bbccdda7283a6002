//! In-process signing backend.
//!
//! Holds the private key for the lifetime of the process and signs the
//! order's canonical payload with an EIP-191 personal-message signature.
//! The key is never logged and never written anywhere.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::hex;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::{OrderRequest, OrderSignature};
use crate::error::SigningError;
use crate::port::outbound::signer::OrderSigner;

/// Signs orders with a locally held private key.
///
/// A signer built without a usable key still constructs; every `sign` call
/// then fails with [`SigningError::KeyUnavailable`].
pub struct LocalSigner {
    key: Result<PrivateKeySigner, String>,
}

impl LocalSigner {
    /// Build from a hex-encoded private key, with or without `0x`.
    #[must_use]
    pub fn from_key(private_key: Option<&str>) -> Self {
        let key = match private_key.map(str::trim) {
            None | Some("") => Err("WALLET_PRIVATE_KEY is not set".to_string()),
            Some(raw) => PrivateKeySigner::from_str(raw)
                .map_err(|e| format!("WALLET_PRIVATE_KEY is invalid: {e}")),
        };
        if let Err(reason) = &key {
            warn!(reason = %reason, "Local signer has no usable key");
        }
        Self { key }
    }

    /// Build from an encrypted JSON keystore.
    #[must_use]
    pub fn from_keystore(path: impl AsRef<Path>, password: &str) -> Self {
        let path = path.as_ref();
        let key = PrivateKeySigner::decrypt_keystore(path, password)
            .map_err(|e| format!("failed to decrypt keystore {}: {e}", path.display()));
        if let Err(reason) = &key {
            warn!(reason = %reason, "Local signer has no usable key");
        }
        Self { key }
    }

    /// Wrap an already loaded key.
    #[must_use]
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self { key: Ok(signer) }
    }

    /// Checksummed address of the key, if one is loaded.
    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.key
            .as_ref()
            .ok()
            .map(|signer| signer.address().to_checksum(None))
    }

    fn signer(&self) -> Result<&PrivateKeySigner, SigningError> {
        self.key
            .as_ref()
            .map_err(|reason| SigningError::KeyUnavailable(reason.clone()))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address())
            .finish()
    }
}

#[async_trait]
impl OrderSigner for LocalSigner {
    async fn sign(&self, order: &OrderRequest) -> Result<OrderSignature, SigningError> {
        let signer = self.signer()?;
        let payload = order.signing_payload()?;
        let signature = signer
            .sign_message_sync(&payload)
            .map_err(|e| SigningError::KeyUnavailable(e.to_string()))?;
        Ok(OrderSignature {
            signature: hex::encode_prefixed(signature.as_bytes()),
            public_key: signer.address().to_checksum(None),
        })
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
