//! Order venue adapters.
//!
//! - [`RestVenue`]: live trading against the venue REST API
//! - [`PaperVenue`]: simulation mode, immediate fills

pub mod dto;
pub mod paper;
pub mod rest;

pub use paper::PaperVenue;
pub use rest::RestVenue;
