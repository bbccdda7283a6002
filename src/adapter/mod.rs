//! Adapters: concrete implementations at the edges of the system.
//!
//! - [`inbound`] - Driving adapters (CLI)
//! - [`outbound`] - Driven adapters (feed, signer, venue, kill switch, alerts)

pub mod inbound;
pub mod outbound;
