//! Configuration sections and loading.
//!
//! - [`settings`] - The top-level [`settings::Config`], env overrides and validation
//! - [`logging`] - Tracing subscriber setup

pub mod alerts;
pub mod execution;
pub mod logging;
pub mod markets;
pub mod risk;
pub mod settings;
pub mod strategy;
pub mod wallet;

pub use settings::{Config, TradingMode};
