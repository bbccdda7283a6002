//! Order execution: signing, bounded-retry submission and settlement.

pub mod retry;
pub mod submitter;

pub use retry::{RetryError, RetryPolicy};
pub use submitter::ExecutionSubmitter;
