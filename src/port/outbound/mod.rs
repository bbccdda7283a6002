//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the infrastructure the pipeline depends on:
//! market data, order signing, order placement, the halt signal, and alerts.

pub mod feed;
pub mod kill_switch;
pub mod notifier;
pub mod signer;
pub mod venue;
