//! Wallet and order signer configuration.

use serde::Deserialize;

/// Wallet configuration for the local signing backend.
///
/// The private key is loaded from `WALLET_PRIVATE_KEY` at runtime, never
/// from the config file. A keystore is used only when that variable is unset.
#[derive(Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Encrypted JSON keystore; its password comes from the environment.
    #[serde(default)]
    pub keystore_path: Option<String>,
    #[serde(skip)]
    pub private_key: Option<String>,
    #[serde(skip)]
    pub keystore_password: Option<String>,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("keystore_path", &self.keystore_path)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field(
                "keystore_password",
                &self.keystore_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Which signing backend produces order signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerKind {
    /// Sign in-process with the wallet key.
    #[default]
    Local,
    /// Delegate to an external signing service over HTTP.
    Remote,
}

/// Order signer selection.
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub backend: SignerKind,
    /// Signing service endpoint. Required for the remote backend.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_signer_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_signer_timeout_ms() -> u64 {
    5_000
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            backend: SignerKind::Local,
            remote_url: None,
            timeout_ms: default_signer_timeout_ms(),
        }
    }
}
