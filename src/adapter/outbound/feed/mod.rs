//! Market data adapters.
//!
//! [`RestSnapshotFeed`] polls the venue's REST API and derives per-interval
//! snapshots from the order book and trade prints.

pub mod dto;
pub mod rest;

pub use rest::{MarketDefaults, RestSnapshotFeed};
