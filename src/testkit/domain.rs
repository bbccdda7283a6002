//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions so tests focus on assertions rather
//! than construction boilerplate.

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{
    Market, MarketId, OrderRequest, OrderSignature, OrderType, Price, ProtectiveParams, Side,
    Signal, SignalId, SignalIntent, SignedOrder, Snapshot, Volume,
};

/// Fixed reference instant so tests do not depend on the wall clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// `t0()` plus `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + ChronoDuration::seconds(secs)
}

/// A market with a 0.01 tick and a minimum order of 1.
pub fn market(id: &str) -> Market {
    Market::new(id, format!("Question for {id}?"), dec!(0.01), dec!(1))
}

/// A snapshot with a one-cent spread around `mid`.
pub fn snapshot(
    market_id: &str,
    timestamp: DateTime<Utc>,
    volume: Decimal,
    trade_count: u64,
    mid: Price,
) -> Snapshot {
    Snapshot {
        market_id: MarketId::from(market_id),
        timestamp,
        volume,
        trade_count,
        best_bid: mid - dec!(0.005),
        best_ask: mid + dec!(0.005),
    }
}

/// A calm baseline of `count` snapshots every 5 seconds starting at `t0()`.
///
/// Volume alternates between 95 and 105 so the baseline has spread, trades
/// alternate between 9 and 11, and the mid sits at 0.50.
pub fn baseline(market_id: &str, count: usize) -> Vec<Snapshot> {
    (0..count)
        .map(|i| {
            let even = i % 2 == 0;
            snapshot(
                market_id,
                at(i as i64 * 5),
                if even { dec!(95) } else { dec!(105) },
                if even { 9 } else { 11 },
                dec!(0.50),
            )
        })
        .collect()
}

/// Default protective exits: 40 bps take profit, 25 bps stop, 10 minutes.
pub fn protective() -> ProtectiveParams {
    ProtectiveParams {
        take_profit_bps: 40,
        stop_loss_bps: 25,
        time_stop: Duration::from_secs(600),
    }
}

/// An entry signal with a minimum size of 1.
pub fn signal(market_id: &str, side: Side, size: Volume, limit_price: Price) -> Signal {
    Signal {
        id: SignalId::new(),
        origin_event: None,
        market_id: MarketId::from(market_id),
        side,
        size,
        limit_price,
        min_size: Decimal::ONE,
        protective: protective(),
        intent: SignalIntent::Open,
        created_at: t0(),
    }
}

/// An unsigned buy of 10 at 0.45 on market `m1`.
pub fn order_request() -> OrderRequest {
    OrderRequest {
        client_order_id: SignalId::new(),
        market_id: MarketId::from("m1"),
        side: Side::Buy,
        price: dec!(0.45),
        size: dec!(10),
        order_type: OrderType::Limit,
        created_at: t0(),
    }
}

/// A sell of 10 at 0.55 on market `m1` with a placeholder signature.
pub fn signed_order() -> SignedOrder {
    let order = OrderRequest {
        side: Side::Sell,
        price: dec!(0.55),
        ..order_request()
    };
    SignedOrder::new(
        order,
        OrderSignature {
            signature: "0xsig".to_string(),
            public_key: "0xkey".to_string(),
        },
    )
}
