//! Inbound (driving) ports: result types handed back to the pipeline.
//!
//! - [`risk`]: Outcome of gating a signal

pub mod risk;
