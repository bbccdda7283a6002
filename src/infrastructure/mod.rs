//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! trading logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`runtime`] - Run-until-shutdown entry point

pub mod bootstrap;
pub mod config;
pub mod runtime;
