//! REST feed wire types.
//!
//! The venue is loose about shapes: lists may come bare or wrapped, ids
//! under several names, numbers as strings. These types absorb that so the
//! feed itself deals only in domain values.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// `GET /markets` body: a bare list or `{"markets": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MarketsResponse {
    List(Vec<MarketDto>),
    Wrapped { markets: Vec<MarketDto> },
}

impl MarketsResponse {
    #[must_use]
    pub fn into_markets(self) -> Vec<MarketDto> {
        match self {
            Self::List(markets) | Self::Wrapped { markets } => markets,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDto {
    #[serde(default, alias = "condition_id", alias = "market_id")]
    pub id: Option<String>,
    #[serde(default, alias = "question")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default, alias = "minimum_tick_size")]
    pub tick_size: Option<Decimal>,
    #[serde(default, alias = "minimum_order_size")]
    pub min_order_size: Option<Decimal>,
}

impl MarketDto {
    /// Markets without an explicit status are treated as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |s| s.eq_ignore_ascii_case("active"))
    }
}

/// One book level: `[price, size]` or `{"price", "size"}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum LevelDto {
    Pair(Decimal, Decimal),
    Object { price: Decimal, size: Decimal },
}

impl LevelDto {
    #[must_use]
    pub const fn price(&self) -> Decimal {
        match self {
            Self::Pair(price, _) | Self::Object { price, .. } => *price,
        }
    }
}

/// `GET /markets/{id}/orderbook` body.
#[derive(Debug, Default, Deserialize)]
pub struct OrderBookDto {
    #[serde(default)]
    pub bids: Vec<LevelDto>,
    #[serde(default)]
    pub asks: Vec<LevelDto>,
}

impl OrderBookDto {
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(LevelDto::price).max()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(LevelDto::price).min()
    }
}

/// `GET /markets/{id}/trades` body: a bare list or `{"trades": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TradesResponse {
    List(Vec<TradeDto>),
    Wrapped { trades: Vec<TradeDto> },
}

impl TradesResponse {
    #[must_use]
    pub fn into_trades(self) -> Vec<TradeDto> {
        match self {
            Self::List(trades) | Self::Wrapped { trades } => trades,
        }
    }
}

/// Trade timestamps arrive as epoch seconds, epoch millis or RFC 3339.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeDto {
    Epoch(f64),
    Text(String),
}

impl TimeDto {
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(value) => {
                // Anything this large is milliseconds.
                let millis = if *value > 1e12 { *value } else { *value * 1000.0 };
                Utc.timestamp_millis_opt(millis as i64).single()
            }
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.with_timezone(&Utc))
                .or_else(|| text.parse::<f64>().ok().and_then(|v| Self::Epoch(v).to_utc())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeDto {
    #[serde(default, alias = "trade_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default, alias = "time")]
    pub timestamp: Option<TimeDto>,
}
