//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`]: Builders for markets, snapshots, signals and orders.
//! - [`http`]: `StubServer`, a one-route HTTP server for adapter tests.
//! - [`feed`]: `ScriptedFeed`, a [`SnapshotFeed`](crate::port::outbound::feed::SnapshotFeed)
//!   that replays queued snapshots per market.
//! - [`venue`]: `ScriptedVenue`, an [`OrderVenue`](crate::port::outbound::venue::OrderVenue)
//!   with queued outcomes and optional latency.
//! - [`signer`]: `StaticSigner` and `FailingSigner` doubles.
//! - [`notifier`]: `RecordingNotifier`, which keeps every event it sees.

pub mod domain;
pub mod feed;
pub mod http;
pub mod notifier;
pub mod signer;
pub mod venue;
