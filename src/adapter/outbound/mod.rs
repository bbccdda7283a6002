//! Outbound adapters (driven side).
//!
//! - [`feed`]: REST snapshot polling
//! - [`kill_switch`]: Sentinel-file and manual halt sources
//! - [`notifier`]: Webhook alert delivery
//! - [`signer`]: Local and remote order signing
//! - [`venue`]: Live and paper order placement

pub mod feed;
pub mod http;
pub mod kill_switch;
pub mod notifier;
pub mod signer;
pub mod venue;
