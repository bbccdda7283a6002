//! Scripted [`SnapshotFeed`] for pipeline and engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Market, MarketId, Snapshot};
use crate::error::{FeedError, Result};
use crate::port::outbound::feed::SnapshotFeed;

/// Replays queued snapshot results per market, in order.
///
/// Once a market's queue is empty every further poll fails with a
/// [`FeedError::Transport`], which the pipeline drops like any feed error.
#[derive(Default)]
pub struct ScriptedFeed {
    markets: Vec<Market>,
    queues: Mutex<HashMap<MarketId, VecDeque<std::result::Result<Snapshot, FeedError>>>>,
    polls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(markets: Vec<Market>) -> Self {
        Self {
            markets,
            ..Self::default()
        }
    }

    /// Queue snapshots for their markets.
    pub fn push_snapshots(&self, snapshots: impl IntoIterator<Item = Snapshot>) {
        let mut queues = self.queues.lock();
        for snapshot in snapshots {
            queues
                .entry(snapshot.market_id.clone())
                .or_default()
                .push_back(Ok(snapshot));
        }
    }

    /// Queue a failure for a market.
    pub fn push_error(&self, error: FeedError) {
        self.queues
            .lock()
            .entry(error.market_id().clone())
            .or_default()
            .push_back(Err(error));
    }

    /// Snapshots still queued for a market.
    pub fn remaining(&self, market_id: &MarketId) -> usize {
        self.queues.lock().get(market_id).map_or(0, VecDeque::len)
    }

    /// Total `get_snapshot` calls so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFeed for ScriptedFeed {
    async fn list_markets(&self, limit: usize) -> Result<Vec<Market>> {
        Ok(self.markets.iter().take(limit).cloned().collect())
    }

    async fn get_snapshot(&self, market: &Market) -> std::result::Result<Snapshot, FeedError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.queues
            .lock()
            .get_mut(market.id())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(FeedError::Transport {
                    market_id: market.id().clone(),
                    reason: "script exhausted".to_string(),
                })
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
