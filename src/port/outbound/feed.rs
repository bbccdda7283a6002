//! Snapshot feed port.
//!
//! The transport (REST polling, websocket) is an adapter concern; the
//! pipeline only sees validated [`Snapshot`] values or a [`FeedError`].

use async_trait::async_trait;

use crate::domain::{Market, Snapshot};
use crate::error::{FeedError, Result};

/// Source of market metadata and periodic snapshots.
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    /// Discover tradable markets, most active first.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of markets to return
    async fn list_markets(&self, limit: usize) -> Result<Vec<Market>>;

    /// Fetch the next snapshot for a market.
    ///
    /// Volume and trade count cover the interval since the previous call
    /// for the same market.
    async fn get_snapshot(&self, market: &Market) -> std::result::Result<Snapshot, FeedError>;

    /// Feed name for logging.
    fn name(&self) -> &'static str;
}
