//! Signal generation from anomaly events.
//!
//! - [`fade`]: contrarian entry against the move that accompanied an anomaly

pub mod fade;

pub use fade::{FadeStrategy, StrategySettings};
