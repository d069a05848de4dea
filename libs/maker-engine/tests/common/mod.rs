//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use maker_engine::application::strategies::inventory_mm::{
    BookSnapshot, InventorySnapshot, LedgerSnapshot, LiveOrders, SolverConfig, SolverInput,
};
use maker_engine::domain::{BestBidAsk, Cents, Level, MarketInfo, Order, OrderTag};
use maker_engine::infrastructure::client::{MarketMetadataProvider, MetadataError};

pub const UP: &str = "up_token";
pub const DOWN: &str = "down_token";

pub fn side(bid: Cents, ask: Cents) -> BestBidAsk {
    BestBidAsk {
        bid: Some(Level { price: bid, size: 100.0 }),
        ask: Some(Level { price: ask, size: 100.0 }),
    }
}

pub fn input(
    inventory: InventorySnapshot,
    book: BookSnapshot,
    ledger: LedgerSnapshot,
    live_orders: LiveOrders,
    time_left_secs: i64,
    config: SolverConfig,
) -> SolverInput {
    SolverInput {
        up_token_id: UP.to_string(),
        down_token_id: DOWN.to_string(),
        inventory,
        book,
        ledger,
        live_orders,
        time_left_secs,
        config,
    }
}

pub fn live_order(id: &str, tag: OrderTag, asset_id: &str, price: Cents, size: f64) -> Order {
    Order {
        id: id.to_string(),
        market_id: "m1".to_string(),
        asset_id: asset_id.to_string(),
        original_size: size,
        matched_size: 0.0,
        price,
        tag,
    }
}

pub fn group_by_tag(orders: Vec<Order>) -> LiveOrders {
    let mut live: LiveOrders = BTreeMap::new();
    for order in orders {
        live.entry(order.tag.clone()).or_default().push(order);
    }
    live
}

/// Metadata provider serving a fixed set of markets keyed by slug
#[derive(Default)]
pub struct StaticMetadata {
    markets: Mutex<HashMap<String, MarketInfo>>,
}

impl StaticMetadata {
    pub fn with_market(self, info: MarketInfo) -> Self {
        self.markets.lock().insert(info.slug.clone(), info);
        self
    }
}

#[async_trait]
impl MarketMetadataProvider for StaticMetadata {
    async fn get_market(&self, slug: &str) -> Result<MarketInfo, MetadataError> {
        self.markets
            .lock()
            .get(slug)
            .cloned()
            .ok_or_else(|| MetadataError::InvalidMarket {
                slug: slug.to_string(),
                reason: "not listed".to_string(),
            })
    }
}

/// Market for the window containing `now`, started `elapsed` ago
pub fn window_market(slug: &str, now: DateTime<Utc>, elapsed: Duration, length: Duration) -> MarketInfo {
    let start = now - elapsed;
    MarketInfo::new("m1", slug, UP, DOWN, start, start + length)
}
