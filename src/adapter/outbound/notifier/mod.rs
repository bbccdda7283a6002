//! Notification adapters.
//!
//! Implements the `port::outbound::notifier::Notifier` trait for alert
//! delivery backends.

pub mod format;
pub mod webhook;

pub use webhook::{WebhookConfig, WebhookNotifier};
