//! Market store
//!
//! Owns every piece of shared mutable market state. Each sub-store carries
//! its own lock; nothing here holds a lock across another store's call.

pub mod books;
pub mod markets;
pub mod orders;
pub mod positions;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Fill, MarketInfo, Order, OrderTag};
use crate::infrastructure::feed::{FeedEvent, OrderEvent, OrderEventKind};

pub use books::BookStore;
pub use markets::MarketDirectory;
pub use orders::OrderRegistry;
pub use positions::{FillOutcome, MarketPositions, PositionStore};

/// Tag given to orders we did not place in this process
pub const EXTERNAL_TAG: &str = "external";

pub type SharedMarketStore = Arc<MarketStore>;

#[derive(Debug, Default)]
pub struct MarketStore {
    pub books: BookStore,
    pub positions: PositionStore,
    pub orders: OrderRegistry,
    pub markets: MarketDirectory,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMarketStore {
        Arc::new(Self::new())
    }

    /// Register a market and hand it any fills that arrived before it was
    /// known. Returns token ids not seen before.
    pub fn register_market(&self, info: MarketInfo) -> Vec<String> {
        let (market_id, up, down) = (
            info.market_id.clone(),
            info.up_token_id.clone(),
            info.down_token_id.clone(),
        );
        let new_tokens = self.markets.register(info);
        self.positions.adopt_market(&market_id, &up, &down);
        new_tokens
    }

    /// Apply one feed event. Returns the markets whose state changed.
    pub fn apply_event(&self, event: &FeedEvent) -> BTreeSet<String> {
        let mut affected = BTreeSet::new();

        match event {
            FeedEvent::BookSnapshot { asset_id, bids, asks } => {
                self.books.apply_snapshot(asset_id, bids, asks);
                self.note_token(asset_id, &mut affected);
            }
            FeedEvent::LevelUpdate { asset_id, side, price, size } => {
                match self.books.apply_level_update(asset_id, *side, *price, *size) {
                    Ok(()) => self.note_token(asset_id, &mut affected),
                    Err(e) => debug!("[Store] Level update for {} rejected: {}", asset_id, e),
                }
            }
            FeedEvent::Fill(fill) => {
                if let Some(market_id) = self.apply_fill(fill) {
                    affected.insert(market_id);
                }
            }
            FeedEvent::Order(order_event) => {
                if let Some(market_id) = self.apply_order_event(order_event) {
                    affected.insert(market_id);
                }
            }
        }

        affected
    }

    /// Record a fill, routing it into the ledger when the token is known.
    /// Returns the market id if the fill was applied.
    pub fn apply_fill(&self, fill: &Fill) -> Option<String> {
        let resolved = self.markets.resolve_token(&fill.asset_id);

        let mut routed = fill.clone();
        let outcome = match &resolved {
            Some((market_id, outcome)) => {
                routed.market_id = market_id.clone();
                Some(*outcome)
            }
            None => None,
        };

        match self.positions.record_fill(&routed, outcome) {
            FillOutcome::Applied if !routed.market_id.is_empty() => Some(routed.market_id),
            _ => None,
        }
    }

    fn apply_order_event(&self, event: &OrderEvent) -> Option<String> {
        match event.kind {
            OrderEventKind::Placement => {
                let known = self.orders.get(&event.id);
                if let Some(order) = known {
                    return Some(order.market_id);
                }
                let (asset_id, price, original_size) =
                    match (&event.asset_id, event.price, event.original_size) {
                        (Some(a), Some(p), Some(s)) => (a.clone(), p, s),
                        _ => {
                            debug!("[Store] Incomplete placement for order {}", event.id);
                            return None;
                        }
                    };
                let market_id = self
                    .markets
                    .resolve_token(&asset_id)
                    .map(|(m, _)| m)
                    .or_else(|| event.market_id.clone())?;

                self.orders.insert_if_absent(Order {
                    id: event.id.clone(),
                    market_id: market_id.clone(),
                    asset_id,
                    original_size,
                    matched_size: event.size_matched.unwrap_or(0.0),
                    price,
                    tag: OrderTag::Other(EXTERNAL_TAG.to_string()),
                });
                Some(market_id)
            }
            OrderEventKind::Update => {
                let order = self.orders.get(&event.id)?;
                if let Some(matched) = event.size_matched {
                    if let Some(done) = self.orders.apply_match(&event.id, matched) {
                        debug!("[Store] Order {} ({}) terminal", done.short_id(), done.tag);
                    }
                }
                Some(order.market_id)
            }
            OrderEventKind::Cancellation => {
                let removed = self.orders.remove(&event.id)?;
                debug!("[Store] Order {} ({}) cancelled", removed.short_id(), removed.tag);
                Some(removed.market_id)
            }
        }
    }

    fn note_token(&self, asset_id: &str, affected: &mut BTreeSet<String>) {
        if let Some((market_id, _)) = self.markets.resolve_token(asset_id) {
            affected.insert(market_id);
        }
    }

    /// Forget expired, inactive markets along with their books, orders and
    /// positions. Returns the markets removed.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Vec<MarketInfo> {
        let removed = self.markets.prune_expired(now);
        for info in &removed {
            self.books.remove(&info.up_token_id);
            self.books.remove(&info.down_token_id);
            let dropped = self.orders.remove_market(&info.market_id);
            self.positions.remove_market(&info.market_id);
            debug!("[Store] Removed {} ({} orders)", info.short_desc(), dropped);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookSide, MarketInfo, Outcome, PriceLevel};
    use chrono::{Duration, Utc};

    fn store_with_market() -> MarketStore {
        let store = MarketStore::new();
        let now = Utc::now();
        store.markets.register(MarketInfo::new(
            "m1",
            "btc-updown-15m-1",
            "up",
            "down",
            now - Duration::minutes(5),
            now + Duration::minutes(10),
        ));
        store
    }

    #[test]
    fn test_book_events_report_market() {
        let store = store_with_market();
        let affected = store.apply_event(&FeedEvent::BookSnapshot {
            asset_id: "up".into(),
            bids: vec![PriceLevel::new("0.40", "10")],
            asks: vec![PriceLevel::new("0.42", "10")],
        });
        assert_eq!(affected.into_iter().collect::<Vec<_>>(), vec!["m1".to_string()]);

        let affected = store.apply_event(&FeedEvent::LevelUpdate {
            asset_id: "stranger".into(),
            side: BookSide::Bid,
            price: 40,
            size: 1.0,
        });
        assert!(affected.is_empty());
        assert!(!store.books.contains("stranger"));

        // Deltas apply once the snapshot is in
        let affected = store.apply_event(&FeedEvent::LevelUpdate {
            asset_id: "up".into(),
            side: BookSide::Bid,
            price: 41,
            size: 1.0,
        });
        assert!(affected.contains("m1"));
        assert_eq!(store.books.best_bid_ask("up").unwrap().bid.unwrap().price, 41);
    }

    #[test]
    fn test_fill_routed_into_ledger() {
        let store = store_with_market();
        let fill = Fill {
            trade_id: Some("t1".into()),
            asset_id: "down".into(),
            market_id: String::new(),
            price: 55,
            size: 10.0,
        };
        let affected = store.apply_event(&FeedEvent::Fill(fill.clone()));
        assert!(affected.contains("m1"));
        let ledger = store.positions.ledger("m1").unwrap();
        assert_eq!(ledger.cheapest_unpaired_price(Outcome::Down), Some(55));

        // Replay is a no-op
        assert!(store.apply_event(&FeedEvent::Fill(fill)).is_empty());
        assert_eq!(store.positions.position("down").unwrap().size, 10.0);
    }

    #[test]
    fn test_fill_before_registration_reaches_ledger() {
        let store = MarketStore::new();
        let fill = Fill {
            trade_id: Some("t0".into()),
            asset_id: "up".into(),
            market_id: String::new(),
            price: 42,
            size: 6.0,
        };
        assert!(store.apply_event(&FeedEvent::Fill(fill)).is_empty());
        assert!(store.positions.ledger("m1").is_none());

        let now = Utc::now();
        store.register_market(MarketInfo::new(
            "m1",
            "btc-updown-15m-1",
            "up",
            "down",
            now - Duration::minutes(5),
            now + Duration::minutes(10),
        ));
        let ledger = store.positions.ledger("m1").unwrap();
        assert_eq!(ledger.cheapest_unpaired_price(Outcome::Up), Some(42));
        assert_eq!(store.positions.position("up").unwrap().market_id, "m1");

        // Pruning the market now takes the early position with it
        store.markets.set_active(Vec::<String>::new());
        assert_eq!(store.prune_expired(now + Duration::minutes(30)).len(), 1);
        assert!(store.positions.position("up").is_none());
    }

    #[test]
    fn test_order_lifecycle_events() {
        let store = store_with_market();
        let place = OrderEvent {
            id: "o1".into(),
            kind: OrderEventKind::Placement,
            asset_id: Some("up".into()),
            market_id: None,
            price: Some(40),
            original_size: Some(10.0),
            size_matched: None,
        };
        store.apply_event(&FeedEvent::Order(place));
        assert_eq!(
            store.orders.get("o1").unwrap().tag,
            OrderTag::Other(EXTERNAL_TAG.to_string())
        );

        let update = OrderEvent {
            id: "o1".into(),
            kind: OrderEventKind::Update,
            asset_id: None,
            market_id: None,
            price: None,
            original_size: None,
            size_matched: Some(10.0),
        };
        let affected = store.apply_event(&FeedEvent::Order(update));
        assert!(affected.contains("m1"));
        assert!(!store.orders.contains("o1"));
    }

    #[test]
    fn test_cancellation_removes_order() {
        let store = store_with_market();
        store.orders.insert(Order {
            id: "o2".into(),
            market_id: "m1".into(),
            asset_id: "down".into(),
            original_size: 5.0,
            matched_size: 0.0,
            price: 50,
            tag: OrderTag::ladder(Outcome::Down, 0),
        });
        let cancel = OrderEvent {
            id: "o2".into(),
            kind: OrderEventKind::Cancellation,
            asset_id: None,
            market_id: None,
            price: None,
            original_size: None,
            size_matched: None,
        };
        assert!(store.apply_event(&FeedEvent::Order(cancel.clone())).contains("m1"));
        assert!(store.orders.is_empty());
        assert!(store.apply_event(&FeedEvent::Order(cancel)).is_empty());
    }

    #[test]
    fn test_prune_expired_clears_everything() {
        let store = store_with_market();
        store.books.apply_snapshot("up", &[PriceLevel::new("0.40", "5")], &[]);
        store.apply_fill(&Fill {
            trade_id: None,
            asset_id: "up".into(),
            market_id: String::new(),
            price: 40,
            size: 5.0,
        });

        // Still running
        assert!(store.prune_expired(Utc::now()).is_empty());

        let removed = store.prune_expired(Utc::now() + Duration::minutes(30));
        assert_eq!(removed.len(), 1);
        assert!(!store.books.contains("up"));
        assert!(store.positions.position("up").is_none());
        assert!(store.markets.is_empty());
    }
}
