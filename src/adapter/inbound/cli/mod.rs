//! Command-line interface.
//!
//! - [`command`] - Argument definitions
//! - [`run`] - `fadebot run`
//! - [`check`] - `fadebot check`

pub mod check;
pub mod command;
pub mod output;
pub mod run;
