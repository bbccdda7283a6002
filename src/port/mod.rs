//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the pipeline and the outside world.
//! Adapters implement them; tests substitute doubles from the `testkit`.
//!
//! # Architecture
//!
//! ```text
//!  SnapshotFeed ──▶ aggregator ─▶ detector ─▶ strategy ─▶ RiskGatekeeper
//!                                                             │
//!                          KillSwitch ◀──── polled ───────────┤
//!                                                             ▼
//!      Notifier ◀── events ── ExecutionSubmitter ──▶ OrderSigner, OrderVenue
//! ```
//!
//! - [`inbound`] - Decision types returned to callers of the pipeline
//! - [`outbound`] - Feed, signer, venue, kill switch and notifier contracts

pub mod inbound;
pub mod outbound;

pub use inbound::risk::{Approval, RejectReason, RiskDecision};
pub use outbound::feed::SnapshotFeed;
pub use outbound::kill_switch::KillSwitch;
pub use outbound::notifier::{Event, Notifier, NotifierRegistry};
pub use outbound::signer::OrderSigner;
pub use outbound::venue::{OrderVenue, VenueAck};
