//! End-to-end: discovery, hydration, feed ingestion and worker cycles
//! against the paper execution client.

mod common;

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};

use common::{window_market, StaticMetadata, DOWN, UP};
use maker_engine::application::strategies::inventory_mm::{
    InventoryMMConfig, InventoryMMStrategy, MarketSpec,
};
use maker_engine::domain::{window_slug, Fill, OrderTag, PriceLevel};
use maker_engine::infrastructure::client::{OpenOrder, PaperCall, PaperExecutionClient};
use maker_engine::infrastructure::feed::FeedEvent;
use maker_engine::infrastructure::{EngineConfig, MarketStore};

fn config() -> EngineConfig {
    EngineConfig {
        inventory_mm: InventoryMMConfig::default()
            .with_markets(vec![MarketSpec::new("btc", "15m", 1)])
            .with_workers(2),
        ..EngineConfig::default()
    }
}

fn current_slug(now: DateTime<Utc>) -> String {
    window_slug("btc", "15m", 900, now.timestamp(), 0)
}

fn book(asset_id: &str, bid: &str, ask: &str) -> FeedEvent {
    FeedEvent::BookSnapshot {
        asset_id: asset_id.to_string(),
        bids: vec![PriceLevel::new(bid, "100")],
        asks: vec![PriceLevel::new(ask, "100")],
    }
}

async fn wait_idle(strategy: &InventoryMMStrategy) {
    let handle = strategy.handle();
    let deadline = Instant::now() + StdDuration::from_secs(5);
    while !handle.is_idle() && Instant::now() < deadline {
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert!(handle.is_idle(), "runner did not drain");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_discover_hydrate_and_quote() {
    let now = Utc::now();
    let metadata = Arc::new(StaticMetadata::default().with_market(window_market(
        &current_slug(now),
        now,
        Duration::minutes(5),
        Duration::minutes(15),
    )));
    let client = Arc::new(
        PaperExecutionClient::new()
            .with_open_orders(
                "m1",
                vec![OpenOrder {
                    id: "stale".to_string(),
                    asset_id: UP.to_string(),
                    price: 30,
                    original_size: 5.0,
                    size_matched: 0.0,
                }],
            )
            .with_trades(
                "m1",
                vec![Fill {
                    trade_id: Some("t1".to_string()),
                    asset_id: UP.to_string(),
                    market_id: "m1".to_string(),
                    price: 40,
                    size: 10.0,
                }],
            ),
    );

    let strategy = InventoryMMStrategy::new(&config(), MarketStore::shared(), metadata, client.clone());

    let discovery = strategy.discover(now).await;
    assert_eq!(discovery.active, vec!["m1".to_string()]);
    assert_eq!(discovery.new_tokens.len(), 2);
    assert!(discovery.unresolved.is_empty());

    let hydration = strategy.hydrate().await;
    assert_eq!(hydration.orders, 1);
    assert_eq!(hydration.fills, 1);

    // Seed both books before the first cycle can see either
    let store = strategy.store().clone();
    store.apply_event(&book(UP, "0.40", "0.42"));
    store.apply_event(&book(DOWN, "0.54", "0.56"));
    assert_eq!(strategy.enqueue_active(), 1);
    wait_idle(&strategy).await;

    let calls = client.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        PaperCall::Cancel { order_ids, .. } if order_ids.contains(&"stale".to_string())
    )));
    assert!(!client.placements().is_empty());
    assert!(!store.orders.contains("stale"));
    for order in store.orders.market_orders("m1") {
        assert!(matches!(order.tag, OrderTag::Ladder { .. }), "unexpected {:?}", order.tag);
    }

    // A fill on the wire updates the position and triggers another cycle
    let queued = strategy
        .ingest(
            r#"{"event_type":"trade","id":"t2","asset_id":"up_token","market":"m1",
                "price":"0.40","size":"5","side":"BUY","status":"MATCHED"}"#,
        )
        .unwrap();
    assert_eq!(queued, 1);
    wait_idle(&strategy).await;

    let position = store.positions.position(UP).unwrap();
    assert!((position.size - 15.0).abs() < 1e-9);

    // Replaying the same trade id changes nothing
    strategy
        .ingest(r#"{"event_type":"trade","id":"t2","asset_id":"up_token","market":"m1","price":"0.40","size":"5","side":"BUY"}"#)
        .unwrap();
    wait_idle(&strategy).await;
    assert!((store.positions.position(UP).unwrap().size - 15.0).abs() < 1e-9);

    strategy.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rolled_over_window_is_pruned() {
    let now = Utc::now();
    let metadata = Arc::new(StaticMetadata::default().with_market(window_market(
        &current_slug(now),
        now,
        Duration::minutes(5),
        Duration::minutes(15),
    )));
    let client = Arc::new(PaperExecutionClient::new());
    let strategy = InventoryMMStrategy::new(&config(), MarketStore::shared(), metadata, client.clone());

    assert_eq!(strategy.discover(now).await.active.len(), 1);

    // Next windows are not listed; the old one has resolved
    let later = strategy.discover(now + Duration::minutes(20)).await;
    assert!(later.active.is_empty());
    assert_eq!(later.pruned.len(), 1);
    assert!(strategy.store().markets.get("m1").is_none());
    assert!(strategy.store().markets.resolve_token(UP).is_none());
    assert_eq!(strategy.enqueue_active(), 0);

    strategy.shutdown();
    assert!(client.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_slug_is_unresolved() {
    let strategy = InventoryMMStrategy::new(
        &config(),
        MarketStore::shared(),
        Arc::new(StaticMetadata::default()),
        Arc::new(PaperExecutionClient::new()),
    );

    let discovery = strategy.discover(Utc::now()).await;
    assert!(discovery.active.is_empty());
    assert_eq!(discovery.unresolved.len(), 1);
    assert!(strategy.ingest("not json").is_err());

    strategy.shutdown();
}
