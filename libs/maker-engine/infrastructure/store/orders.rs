//! Order registry
//!
//! Live-order bookkeeping indexed by id and by market.
//! Entries are created on successful placement and removed on confirmed
//! cancellation or terminal fill.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{Order, OrderTag};

#[derive(Debug, Default)]
struct RegistryState {
    orders: HashMap<String, Order>,
    by_market: HashMap<String, BTreeSet<String>>,
}

impl RegistryState {
    fn unindex(&mut self, order: &Order) {
        if let Some(ids) = self.by_market.get_mut(&order.market_id) {
            ids.remove(&order.id);
            if ids.is_empty() {
                self.by_market.remove(&order.market_id);
            }
        }
    }

    fn index(&mut self, order: &Order) {
        self.by_market
            .entry(order.market_id.clone())
            .or_default()
            .insert(order.id.clone());
    }
}

#[derive(Debug, Default)]
pub struct OrderRegistry {
    inner: RwLock<RegistryState>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order by id
    pub fn insert(&self, order: Order) {
        let mut state = self.inner.write();
        if let Some(previous) = state.orders.remove(&order.id) {
            state.unindex(&previous);
        }
        state.index(&order);
        state.orders.insert(order.id.clone(), order);
    }

    /// Insert only if the id is not already tracked. Returns whether it was inserted.
    pub fn insert_if_absent(&self, order: Order) -> bool {
        let mut state = self.inner.write();
        if state.orders.contains_key(&order.id) {
            return false;
        }
        state.index(&order);
        state.orders.insert(order.id.clone(), order);
        true
    }

    pub fn remove(&self, order_id: &str) -> Option<Order> {
        let mut state = self.inner.write();
        let order = state.orders.remove(order_id)?;
        state.unindex(&order);
        Some(order)
    }

    /// Record cumulative matched size. A fully matched order is removed and returned.
    pub fn apply_match(&self, order_id: &str, matched_size: f64) -> Option<Order> {
        let mut state = self.inner.write();
        let order = state.orders.get_mut(order_id)?;
        order.matched_size = order.matched_size.max(matched_size);

        if order.is_filled() {
            let order = state.orders.remove(order_id)?;
            state.unindex(&order);
            debug!("[Registry] Order {} fully matched", order.short_id());
            return Some(order);
        }
        None
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.inner.read().orders.get(order_id).cloned()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.inner.read().orders.contains_key(order_id)
    }

    /// All orders for a market, ordered by id
    pub fn market_orders(&self, market_id: &str) -> Vec<Order> {
        let state = self.inner.read();
        state
            .by_market
            .get(market_id)
            .map(|ids| ids.iter().filter_map(|id| state.orders.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Live orders for a market grouped by tag, skipping remainders at or below `dust`
    pub fn live_by_tag(&self, market_id: &str, dust: f64) -> BTreeMap<OrderTag, Vec<Order>> {
        let mut grouped: BTreeMap<OrderTag, Vec<Order>> = BTreeMap::new();
        for order in self.market_orders(market_id) {
            if order.remaining() <= dust {
                continue;
            }
            grouped.entry(order.tag.clone()).or_default().push(order);
        }
        grouped
    }

    /// Drop every order of a market. Returns how many were removed.
    pub fn remove_market(&self, market_id: &str) -> usize {
        let mut state = self.inner.write();
        let ids = state.by_market.remove(market_id).unwrap_or_default();
        for id in &ids {
            if let Some(order) = state.orders.remove(id) {
                state.unindex(&order);
            }
        }
        ids.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cents, Outcome};

    fn order(id: &str, market: &str, asset: &str, price: Cents, tag: OrderTag) -> Order {
        Order {
            id: id.to_string(),
            market_id: market.to_string(),
            asset_id: asset.to_string(),
            original_size: 10.0,
            matched_size: 0.0,
            price,
            tag,
        }
    }

    #[test]
    fn test_insert_and_group_by_tag() {
        let registry = OrderRegistry::new();
        registry.insert(order("a", "m1", "up", 40, OrderTag::ladder(Outcome::Up, 0)));
        registry.insert(order("b", "m1", "up", 39, OrderTag::ladder(Outcome::Up, 1)));
        registry.insert(order("c", "m1", "up", 41, OrderTag::ladder(Outcome::Up, 0)));
        registry.insert(order("d", "m2", "x", 10, OrderTag::ladder(Outcome::Up, 0)));

        let live = registry.live_by_tag("m1", 0.1);
        assert_eq!(live.len(), 2);
        let l0: Vec<_> = live[&OrderTag::ladder(Outcome::Up, 0)].iter().map(|o| o.id.as_str()).collect();
        assert_eq!(l0, vec!["a", "c"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_reinsert_moves_market_index() {
        let registry = OrderRegistry::new();
        registry.insert(order("a", "m1", "up", 40, OrderTag::Other("external".into())));
        registry.insert(order("a", "m2", "up", 41, OrderTag::ladder(Outcome::Up, 0)));

        assert!(registry.market_orders("m1").is_empty());
        assert_eq!(registry.market_orders("m2")[0].price, 41);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_partial_then_full_match() {
        let registry = OrderRegistry::new();
        registry.insert(order("a", "m1", "up", 40, OrderTag::ladder(Outcome::Up, 0)));

        assert!(registry.apply_match("a", 4.0).is_none());
        assert_eq!(registry.get("a").unwrap().remaining(), 6.0);

        let done = registry.apply_match("a", 10.0).unwrap();
        assert_eq!(done.id, "a");
        assert!(!registry.contains("a"));
        assert!(registry.market_orders("m1").is_empty());
    }

    #[test]
    fn test_matched_size_never_regresses() {
        let registry = OrderRegistry::new();
        registry.insert(order("a", "m1", "up", 40, OrderTag::ladder(Outcome::Up, 0)));
        registry.apply_match("a", 6.0);
        registry.apply_match("a", 2.0);
        assert_eq!(registry.get("a").unwrap().matched_size, 6.0);
    }

    #[test]
    fn test_dust_filtered_from_live_view() {
        let registry = OrderRegistry::new();
        let mut o = order("a", "m1", "up", 40, OrderTag::ladder(Outcome::Up, 0));
        o.matched_size = 9.95;
        registry.insert(o);
        assert!(registry.live_by_tag("m1", 0.1).is_empty());
        assert_eq!(registry.market_orders("m1").len(), 1);
    }

    #[test]
    fn test_insert_if_absent_and_remove_market() {
        let registry = OrderRegistry::new();
        assert!(registry.insert_if_absent(order("a", "m1", "up", 40, OrderTag::ladder(Outcome::Up, 0))));
        assert!(!registry.insert_if_absent(order("a", "m1", "up", 40, OrderTag::Other("x".into()))));
        assert_eq!(registry.get("a").unwrap().tag, OrderTag::ladder(Outcome::Up, 0));

        registry.insert(order("b", "m1", "down", 50, OrderTag::ladder(Outcome::Down, 0)));
        assert_eq!(registry.remove_market("m1"), 2);
        assert!(registry.is_empty());
        assert!(registry.remove("a").is_none());
    }
}
