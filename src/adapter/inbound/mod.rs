//! Inbound adapters (driving side).
//!
//! - [`cli`] - Command-line entry points

pub mod cli;
