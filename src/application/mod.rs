//! Application services (use cases).
//!
//! These services run the detection, decision, gating and execution stages
//! on top of the domain types and the outbound ports.

pub mod aggregator;
pub mod detector;
pub mod execution;
pub mod orchestration;
pub mod risk;
pub mod state;
pub mod strategy;
