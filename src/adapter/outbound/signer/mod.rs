//! Order signing backends.
//!
//! Two interchangeable implementations of [`OrderSigner`]:
//!
//! - [`LocalSigner`]: in-process key from the environment or a keystore
//! - [`RemoteSigner`]: external signing service over HTTP
//!
//! The backend is chosen once by [`build_signer`]; nothing else in the
//! crate branches on which one is active.

pub mod local;
pub mod remote;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{hex, Address, Signature};
use tracing::info;
use url::Url;

pub use local::LocalSigner;
pub use remote::RemoteSigner;

use crate::domain::OrderSignature;
use crate::error::SigningError;
use crate::port::outbound::signer::OrderSigner;

/// Resolved signer selection.
#[derive(Clone)]
pub enum SignerBackend {
    /// Sign in-process. `None` means no key was supplied.
    Local { private_key: Option<String> },
    /// Sign in-process with a key decrypted from a keystore file.
    Keystore { path: String, password: String },
    /// Delegate to an external service.
    Remote { url: Url, timeout: Duration },
}

impl std::fmt::Debug for SignerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { private_key } => f
                .debug_struct("Local")
                .field("key_present", &private_key.is_some())
                .finish(),
            Self::Keystore { path, .. } => {
                f.debug_struct("Keystore").field("path", path).finish()
            }
            Self::Remote { url, timeout } => f
                .debug_struct("Remote")
                .field("url", &url.as_str())
                .field("timeout", timeout)
                .finish(),
        }
    }
}

/// Build the configured signer.
///
/// # Errors
///
/// Returns an error only if the remote signer's HTTP client cannot be
/// built. A missing or invalid local key still yields a signer whose every
/// call fails.
pub fn build_signer(backend: SignerBackend) -> Result<Arc<dyn OrderSigner>, SigningError> {
    let signer: Arc<dyn OrderSigner> = match backend {
        SignerBackend::Local { private_key } => {
            Arc::new(LocalSigner::from_key(private_key.as_deref()))
        }
        SignerBackend::Keystore { path, password } => {
            Arc::new(LocalSigner::from_keystore(path, &password))
        }
        SignerBackend::Remote { url, timeout } => Arc::new(RemoteSigner::new(url, timeout)?),
    };
    info!(backend = signer.backend_name(), "Order signer ready");
    Ok(signer)
}

/// Check that `signature` was produced over `payload` by the key behind
/// `signature.public_key`.
///
/// # Errors
///
/// Returns [`SigningError::Verification`] if either field is malformed or
/// the recovered address differs.
pub fn verify_signature(payload: &[u8], signature: &OrderSignature) -> Result<(), SigningError> {
    let bytes = hex::decode(&signature.signature)
        .map_err(|e| SigningError::Verification(format!("signature is not hex: {e}")))?;
    let parsed = Signature::try_from(bytes.as_slice())
        .map_err(|e| SigningError::Verification(format!("bad signature: {e}")))?;
    let expected = Address::from_str(&signature.public_key)
        .map_err(|e| SigningError::Verification(format!("bad public key: {e}")))?;
    let recovered = parsed
        .recover_address_from_msg(payload)
        .map_err(|e| SigningError::Verification(e.to_string()))?;

    if recovered == expected {
        Ok(())
    } else {
        Err(SigningError::Verification(format!(
            "recovered {recovered}, expected {expected}"
        )))
    }
}
