//! Plan executor - runs a reconciliation plan against the execution client.
//!
//! Called from a worker thread that owns a tokio runtime; each network call
//! is driven with `block_on` under the configured request timeout.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use super::report::ExecutionReport;
use crate::application::strategies::inventory_mm::types::{DesiredOrder, Plan};
use crate::domain::{truncate_id, Order, OrderTag, MAX_PRICE_CENTS, MIN_PRICE_CENTS};
use crate::infrastructure::client::{ExecutionClient, ExecutionError};
use crate::infrastructure::store::SharedMarketStore;

pub struct PlanExecutor {
    client: Arc<dyn ExecutionClient>,
    store: SharedMarketStore,
    request_timeout: Duration,
    min_order_size: f64,
}

impl PlanExecutor {
    pub fn new(
        client: Arc<dyn ExecutionClient>,
        store: SharedMarketStore,
        request_timeout: Duration,
        min_order_size: f64,
    ) -> Self {
        Self {
            client,
            store,
            request_timeout,
            min_order_size,
        }
    }

    /// Cancels first, then placements. Tags whose cancel failed are not re-placed.
    pub fn execute(&self, runtime: &Runtime, market_id: &str, plan: &Plan) -> ExecutionReport {
        let mut report = ExecutionReport::new();
        if plan.is_empty() {
            return report;
        }

        let mut failed_tags: BTreeSet<OrderTag> = BTreeSet::new();

        for (tag, ids) in &plan.cancel_by_tag {
            if ids.is_empty() {
                continue;
            }
            let reason = tag.to_string();
            match self.call(runtime, self.client.cancel_orders(ids, &reason)) {
                Ok(()) => {
                    for id in ids {
                        self.store.orders.remove(id);
                    }
                    info!("[Executor] market={} tag={} cancelled {}", short(market_id), tag, ids.len());
                    report.cancelled_ids.extend(ids.iter().cloned());
                }
                Err(e) => {
                    warn!("[Executor] market={} tag={} cancel failed: {}", short(market_id), tag, e);
                    report.add_error(format!("cancel {}", tag), e.to_string());
                    failed_tags.insert(tag.clone());
                }
            }
        }

        for order in &plan.place {
            if failed_tags.contains(&order.tag) {
                debug!("[Executor] tag={} skipped, cancel pending", order.tag);
                report.skipped_tags.push(order.tag.clone());
                continue;
            }
            report.merge(self.place(runtime, market_id, order));
        }

        if report.has_errors() {
            for (context, err) in &report.errors {
                error!("[Executor] market={} error in {}: {}", short(market_id), context, err);
            }
        } else {
            debug!(
                "[Executor] market={} completed: cancelled={}, placed={}",
                short(market_id),
                report.cancelled_count(),
                report.placed_count()
            );
        }

        report
    }

    fn place(&self, runtime: &Runtime, market_id: &str, order: &DesiredOrder) -> ExecutionReport {
        let mut report = ExecutionReport::new();

        if order.price < MIN_PRICE_CENTS || order.price > MAX_PRICE_CENTS {
            report.add_error(format!("place {}", order.tag), format!("price {}c out of range", order.price));
            return report;
        }
        if order.size < self.min_order_size {
            report.add_error(
                format!("place {}", order.tag),
                format!("size {:.2} below minimum {:.2}", order.size, self.min_order_size),
            );
            return report;
        }

        match self.call(
            runtime,
            self.client.place_limit_buy(&order.token_id, order.price, order.size),
        ) {
            Ok(order_id) => {
                self.store.orders.insert(Order {
                    id: order_id.clone(),
                    market_id: market_id.to_string(),
                    asset_id: order.token_id.clone(),
                    original_size: order.size,
                    matched_size: 0.0,
                    price: order.price,
                    tag: order.tag.clone(),
                });
                info!("[Executor] market={} placed {} order={}", short(market_id), order, order_id);
                report.placed.push((order.tag.clone(), order_id));
            }
            Err(e) => {
                report.add_error(format!("place {}", order.tag), e.to_string());
            }
        }

        report
    }

    fn call<T, F>(&self, runtime: &Runtime, fut: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T, ExecutionError>>,
    {
        let timeout = self.request_timeout;
        runtime.block_on(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(ExecutionError::Timeout(timeout.as_millis() as u64)),
            }
        })
    }
}

fn short(id: &str) -> &str {
    truncate_id(id, 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;
    use crate::infrastructure::client::{PaperCall, PaperExecutionClient};
    use crate::infrastructure::store::MarketStore;

    fn setup(client: Arc<PaperExecutionClient>) -> (PlanExecutor, SharedMarketStore, Runtime) {
        let store = MarketStore::shared();
        let executor = PlanExecutor::new(client, store.clone(), Duration::from_millis(200), 5.0);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        (executor, store, runtime)
    }

    fn live(id: &str, tag: OrderTag) -> Order {
        Order {
            id: id.into(),
            market_id: "m1".into(),
            asset_id: "up".into(),
            original_size: 5.0,
            matched_size: 0.0,
            price: 40,
            tag,
        }
    }

    #[test]
    fn test_cancels_then_places_and_updates_registry() {
        let client = Arc::new(PaperExecutionClient::new());
        let (executor, store, runtime) = setup(client.clone());
        let tag = OrderTag::ladder(Outcome::Up, 0);
        store.orders.insert(live("old", tag.clone()));

        let mut plan = Plan::new();
        plan.add_cancel(&tag, "old");
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 42, 5.0, 0));

        let report = executor.execute(&runtime, "m1", &plan);
        assert!(report.success());
        assert_eq!(report.cancelled_ids, vec!["old".to_string()]);
        assert_eq!(report.placed_count(), 1);

        let calls = client.calls();
        assert!(matches!(calls[0], PaperCall::Cancel { .. }));
        assert!(matches!(calls[1], PaperCall::Place { price: 42, .. }));

        assert!(!store.orders.contains("old"));
        let live = store.orders.live_by_tag("m1", 0.1);
        assert_eq!(live[&tag][0].price, 42);
    }

    #[test]
    fn test_failed_cancel_blocks_replacement() {
        let client = Arc::new(PaperExecutionClient::new());
        client.set_fail_cancels(true);
        let (executor, store, runtime) = setup(client.clone());
        let tag = OrderTag::ladder(Outcome::Up, 0);
        store.orders.insert(live("old", tag.clone()));

        let mut plan = Plan::new();
        plan.add_cancel(&tag, "old");
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 42, 5.0, 0));
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 41, 5.0, 1));

        let report = executor.execute(&runtime, "m1", &plan);
        assert!(report.has_errors());
        assert_eq!(report.skipped_tags, vec![tag]);
        assert_eq!(report.placed_count(), 1);
        // order left live
        assert!(store.orders.contains("old"));
    }

    #[test]
    fn test_guard_rejects_bad_orders() {
        let client = Arc::new(PaperExecutionClient::new());
        let (executor, store, runtime) = setup(client.clone());

        let mut plan = Plan::new();
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 0, 5.0, 0));
        plan.place.push(DesiredOrder::ladder(Outcome::Down, "down", 40, 1.0, 0));

        let report = executor.execute(&runtime, "m1", &plan);
        assert_eq!(report.errors.len(), 2);
        assert!(client.calls().is_empty());
        assert!(store.orders.is_empty());
    }

    #[test]
    fn test_multibyte_market_id_in_logs() {
        let client = Arc::new(PaperExecutionClient::new());
        let (executor, store, runtime) = setup(client);
        // Byte 8 falls inside the two-byte 'é'
        let market = "market-é1";
        assert!(!market.is_char_boundary(8));

        let mut plan = Plan::new();
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 40, 5.0, 0));

        let report = executor.execute(&runtime, market, &plan);
        assert_eq!(report.placed_count(), 1);
        assert_eq!(store.orders.len(), 1);
        assert_eq!(short(market), "market-é");
    }

    #[test]
    fn test_timeout_is_an_error() {
        let client = Arc::new(PaperExecutionClient::new().with_latency(Duration::from_secs(5)));
        let (executor, store, runtime) = setup(client);

        let mut plan = Plan::new();
        plan.place.push(DesiredOrder::ladder(Outcome::Up, "up", 40, 5.0, 0));

        let report = executor.execute(&runtime, "m1", &plan);
        assert_eq!(report.placed_count(), 0);
        assert!(report.errors[0].1.contains("timed out"));
        assert!(store.orders.is_empty());
    }
}
