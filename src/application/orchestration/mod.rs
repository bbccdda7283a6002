//! Pipeline orchestration.
//!
//! Wires the per-market stages, the protective-exit monitor and execution
//! dispatch into one engine with graceful shutdown.
//!
//! # Modules
//!
//! - [`context`]: Shared services handed to every pipeline
//! - [`market`]: Per-market aggregation, detection, strategy and gating
//! - [`exit`]: Periodic protective-exit scan
//! - [`engine`]: Task wiring, execution dispatch and shutdown

pub mod context;
pub mod engine;
pub mod exit;
pub mod market;

pub use context::PipelineContext;
pub use engine::{Engine, EngineSettings};
pub use exit::ProtectiveExitMonitor;
pub use market::{MarketPipeline, TickOutcome};
