//! Risk gating for candidate signals.
//!
//! The gatekeeper is the only writer of exposure reservations and owns the
//! check-then-reserve critical section.

pub mod gatekeeper;

pub use gatekeeper::RiskGatekeeper;
