//! Snapshot feed built on REST polling.
//!
//! Each poll reads the order book for the touch and the recent trade prints
//! for activity. Volume and trade count cover only prints newer than the
//! market's trade cursor, so each snapshot reports activity since the
//! previous one.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::dto::{MarketsResponse, OrderBookDto, TradeDto, TradesResponse};
use crate::adapter::outbound::http::{client_with_timeouts, endpoint, ApiCredentials};
use crate::domain::{Market, MarketId, Price, Snapshot, Volume};
use crate::error::{FeedError, Result};
use crate::port::outbound::feed::SnapshotFeed;

/// Metadata applied when the venue omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketDefaults {
    pub tick_size: Price,
    pub min_order_size: Volume,
}

/// Trades already counted for a market.
#[derive(Debug, Default)]
struct TradeCursor {
    last_seen: Option<DateTime<Utc>>,
    ids_at_last: HashSet<String>,
}

impl TradeCursor {
    /// Sum the prints newer than the cursor and advance it.
    ///
    /// The first call only seeds the cursor: prints from before the feed
    /// started are not activity since a previous snapshot. With no
    /// timestamped prints to seed from, the cursor starts at `now`.
    fn advance(&mut self, trades: &[TradeDto], now: DateTime<Utc>) -> (Volume, u64) {
        let seeding = self.last_seen.is_none();
        let mut volume = Decimal::ZERO;
        let mut count = 0u64;
        let mut newest = self.last_seen;
        let mut newest_ids = self.ids_at_last.clone();

        for trade in trades {
            let Some(at) = trade.timestamp.as_ref().and_then(|t| t.to_utc()) else {
                continue;
            };
            let id = trade.id.clone().unwrap_or_default();
            let is_new = match self.last_seen {
                None => true,
                Some(last) => at > last || (at == last && !self.ids_at_last.contains(&id)),
            };
            if !is_new {
                continue;
            }
            volume += trade.size.unwrap_or_default().abs();
            count += 1;

            match newest {
                Some(current) if at < current => {}
                Some(current) if at == current => {
                    newest_ids.insert(id);
                }
                _ => {
                    newest = Some(at);
                    newest_ids = HashSet::from([id]);
                }
            }
        }

        self.ids_at_last = newest_ids;
        self.last_seen = match newest {
            None if seeding => Some(now),
            other => other,
        };
        if seeding {
            (Decimal::ZERO, 0)
        } else {
            (volume, count)
        }
    }
}

/// REST polling implementation of [`SnapshotFeed`].
pub struct RestSnapshotFeed {
    http: HttpClient,
    api_url: String,
    credentials: ApiCredentials,
    defaults: MarketDefaults,
    trade_limit: usize,
    cursors: Mutex<HashMap<MarketId, TradeCursor>>,
}

impl RestSnapshotFeed {
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        credentials: ApiCredentials,
        defaults: MarketDefaults,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            http: client_with_timeouts(timeout, connect_timeout),
            api_url: api_url.into(),
            credentials,
            defaults,
            trade_limit: 200,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// Build a market from an id alone, using the configured defaults.
    #[must_use]
    pub fn market_from_id(&self, id: &str) -> Market {
        Market::new(id, "", self.defaults.tick_size, self.defaults.min_order_size)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        market_id: &MarketId,
    ) -> std::result::Result<T, FeedError> {
        let transport = |reason: String| FeedError::Transport {
            market_id: market_id.clone(),
            reason,
        };
        let response = self
            .credentials
            .apply(self.http.get(url))
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| transport(e.to_string()))?;
        let body = response.text().await.map_err(|e| transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FeedError::Malformed {
            market_id: market_id.clone(),
            field: "body",
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SnapshotFeed for RestSnapshotFeed {
    async fn list_markets(&self, limit: usize) -> Result<Vec<Market>> {
        let url = format!("{}?limit={limit}", endpoint(&self.api_url, "markets"));
        info!(url = %url, "Fetching markets");

        let response: MarketsResponse = self
            .credentials
            .apply(self.http.get(&url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut markets: Vec<_> = response
            .into_markets()
            .into_iter()
            .filter(|m| m.is_active())
            .filter_map(|m| {
                let id = m.id.clone().filter(|id| !id.is_empty())?;
                Some((m.volume.unwrap_or_default(), m, id))
            })
            .collect();
        markets.sort_by(|a, b| b.0.cmp(&a.0));
        markets.truncate(limit);

        debug!(count = markets.len(), "Fetched active markets");
        Ok(markets
            .into_iter()
            .map(|(_, m, id)| {
                Market::new(
                    id,
                    m.title.unwrap_or_default(),
                    m.tick_size.unwrap_or(self.defaults.tick_size),
                    m.min_order_size.unwrap_or(self.defaults.min_order_size),
                )
            })
            .collect())
    }

    async fn get_snapshot(&self, market: &Market) -> std::result::Result<Snapshot, FeedError> {
        let market_id = market.id();
        let base = endpoint(&self.api_url, &format!("markets/{market_id}"));

        let book_url = format!("{base}/orderbook");
        let trades_url = format!("{base}/trades?limit={}", self.trade_limit);
        let (book, trades): (OrderBookDto, TradesResponse) = try_join(
            self.get_json(&book_url, market_id),
            self.get_json(&trades_url, market_id),
        )
        .await?;
        let now = Utc::now();

        let best_bid = book.best_bid().ok_or_else(|| FeedError::MissingField {
            market_id: market_id.clone(),
            field: "best_bid",
        })?;
        let best_ask = book.best_ask().ok_or_else(|| FeedError::MissingField {
            market_id: market_id.clone(),
            field: "best_ask",
        })?;

        let (volume, trade_count) = self
            .cursors
            .lock()
            .entry(market_id.clone())
            .or_default()
            .advance(&trades.into_trades(), now);

        Ok(Snapshot {
            market_id: market_id.clone(),
            timestamp: now,
            volume,
            trade_count,
            best_bid,
            best_ask,
        })
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::feed::dto::TimeDto;
    use crate::testkit::http::StubServer;
    use rust_decimal_macros::dec;

    fn trade(id: &str, secs: f64, size: Decimal) -> TradeDto {
        TradeDto {
            id: Some(id.to_string()),
            size: Some(size),
            timestamp: Some(TimeDto::Epoch(secs)),
        }
    }

    fn epoch(secs: f64) -> DateTime<Utc> {
        TimeDto::Epoch(secs).to_utc().unwrap()
    }

    fn defaults() -> MarketDefaults {
        MarketDefaults {
            tick_size: dec!(0.01),
            min_order_size: dec!(5),
        }
    }

    #[test]
    fn cursor_counts_only_new_prints() {
        let mut cursor = TradeCursor::default();
        let now = epoch(200.0);
        let first = vec![trade("a", 100.0, dec!(2)), trade("b", 101.0, dec!(3))];
        assert_eq!(cursor.advance(&first, now), (Decimal::ZERO, 0));

        let second = vec![
            trade("a", 100.0, dec!(2)),
            trade("b", 101.0, dec!(3)),
            trade("c", 101.0, dec!(1)),
            trade("d", 105.0, dec!(4)),
        ];
        assert_eq!(cursor.advance(&second, now), (dec!(5), 2));
        assert_eq!(cursor.advance(&second, now), (Decimal::ZERO, 0));
    }

    #[test]
    fn empty_first_poll_seeds_cursor_at_now() {
        let mut cursor = TradeCursor::default();
        assert_eq!(cursor.advance(&[], epoch(100.0)), (Decimal::ZERO, 0));
        assert_eq!(cursor.last_seen, Some(epoch(100.0)));

        let later = vec![trade("old", 90.0, dec!(7)), trade("new", 110.0, dec!(2))];
        assert_eq!(cursor.advance(&later, epoch(120.0)), (dec!(2), 1));
    }

    #[tokio::test]
    async fn list_markets_sorts_by_volume_and_filters_inactive() {
        let server = StubServer::respond(
            200,
            r#"{"markets":[
                {"id":"low","volume":1,"status":"active"},
                {"id":"closed","volume":100,"status":"closed"},
                {"id":"high","volume":50,"tick_size":"0.001"}
            ]}"#,
        )
        .await;
        let feed = RestSnapshotFeed::new(
            server.url(),
            ApiCredentials::default(),
            defaults(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let markets = feed.list_markets(10).await.unwrap();

        let ids: Vec<_> = markets.iter().map(|m| m.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["high", "low"]);
        assert_eq!(markets[0].tick_size(), dec!(0.001));
        assert_eq!(markets[1].min_order_size(), dec!(5));
    }

    #[tokio::test]
    async fn transport_failure_is_a_feed_error() {
        let feed = RestSnapshotFeed::new(
            "http://127.0.0.1:9",
            ApiCredentials::default(),
            defaults(),
            Duration::from_millis(200),
            Duration::from_millis(200),
        );
        let market = feed.market_from_id("m1");
        let err = feed.get_snapshot(&market).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport { .. }));
        assert_eq!(err.market_id().as_str(), "m1");
    }
}
