//! Inventory MM Strategy - wiring of discovery, ingestion and the runner.
//!
//! Feed messages mutate the market store and enqueue the markets they touched;
//! the runner's workers do the deciding.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::components::executor::PlanExecutor;
use super::config::InventoryMMConfig;
use super::cycle::CycleContext;
use super::runner::{Enqueue, RunnerHandle, StrategyRunner};
use crate::domain::{window_slug, MarketInfo, Order, OrderTag};
use crate::infrastructure::client::{ExecutionClient, ExecutionError, MarketMetadataProvider};
use crate::infrastructure::config::{EngineConfig, RunMode};
use crate::infrastructure::feed::{parse_message, FeedError, FeedEvent};
use crate::infrastructure::snapshot::SnapshotRecorder;
use crate::infrastructure::store::{SharedMarketStore, EXTERNAL_TAG};

/// Outcome of one discovery pass
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Markets now active
    pub active: Vec<String>,
    /// Token ids seen for the first time (to subscribe to)
    pub new_tokens: Vec<String>,
    /// Slugs the metadata provider could not resolve
    pub unresolved: Vec<String>,
    /// Expired markets dropped from the store
    pub pruned: Vec<MarketInfo>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HydrationReport {
    pub orders: usize,
    pub fills: usize,
}

pub struct InventoryMMStrategy {
    config: InventoryMMConfig,
    store: SharedMarketStore,
    metadata: Arc<dyn MarketMetadataProvider>,
    client: Arc<dyn ExecutionClient>,
    recorder: Option<Arc<SnapshotRecorder>>,
    runner: StrategyRunner,
}

impl InventoryMMStrategy {
    /// Create the strategy and start its workers.
    pub fn new(
        config: &EngineConfig,
        store: SharedMarketStore,
        metadata: Arc<dyn MarketMetadataProvider>,
        client: Arc<dyn ExecutionClient>,
    ) -> Self {
        let mm = config.inventory_mm.clone();

        let recorder = (config.mode == RunMode::Observe)
            .then(|| Arc::new(SnapshotRecorder::new(&config.snapshot.dir)));

        let executor = PlanExecutor::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Duration::from_millis(mm.request_timeout_ms),
            mm.solver.min_order_size,
        );
        let cycle = Arc::new(CycleContext::new(
            Arc::clone(&store),
            executor,
            mm.clone(),
            config.mode,
            recorder.clone(),
        ));
        let runner = StrategyRunner::spawn(cycle, mm.workers, mm.queue_capacity);

        info!(
            "[InventoryMM] Ready: mode={:?}, {} market specs",
            config.mode,
            mm.markets.len()
        );

        Self {
            config: mm,
            store,
            metadata,
            client,
            recorder,
            runner,
        }
    }

    pub fn store(&self) -> &SharedMarketStore {
        &self.store
    }

    pub fn handle(&self) -> RunnerHandle {
        self.runner.handle()
    }

    pub fn recorder(&self) -> Option<&Arc<SnapshotRecorder>> {
        self.recorder.as_ref()
    }

    /// Resolve the current windows, register them and replace the active set.
    pub async fn discover(&self, now: DateTime<Utc>) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for spec in &self.config.markets {
            let Some(interval) = spec.interval_secs() else {
                warn!("[InventoryMM] Unknown timeframe {} for {}", spec.timeframe, spec.symbol);
                continue;
            };

            for index in 0..spec.count as u32 {
                let slug = window_slug(&spec.symbol, &spec.timeframe, interval, now.timestamp(), index);
                match self.metadata.get_market(&slug).await {
                    Ok(info) if info.is_expired(now) => {
                        debug!("[InventoryMM] {} already resolved", slug);
                        report.unresolved.push(slug);
                    }
                    Ok(info) => {
                        report.active.push(info.market_id.clone());
                        report.new_tokens.extend(self.store.register_market(info));
                    }
                    Err(e) => {
                        debug!("[InventoryMM] {} not available: {}", slug, e);
                        report.unresolved.push(slug);
                    }
                }
            }
        }

        self.store.markets.set_active(report.active.iter().cloned());
        report.pruned = self.store.prune_expired(now);
        if let Some(recorder) = &self.recorder {
            for info in &report.pruned {
                recorder.forget(&info.slug);
            }
        }

        if !report.new_tokens.is_empty() || !report.pruned.is_empty() {
            info!(
                "[InventoryMM] Discovery: {} active, {} new tokens, {} pruned",
                report.active.len(),
                report.new_tokens.len(),
                report.pruned.len()
            );
        }
        report
    }

    /// Load resting orders and past fills for every active market.
    pub async fn hydrate(&self) -> HydrationReport {
        let mut report = HydrationReport::default();

        for info in self.store.markets.active_markets() {
            match self.with_timeout(self.client.open_orders(&info.market_id)).await {
                Ok(orders) => {
                    for open in orders {
                        let inserted = self.store.orders.insert_if_absent(Order {
                            id: open.id,
                            market_id: info.market_id.clone(),
                            asset_id: open.asset_id,
                            original_size: open.original_size,
                            matched_size: open.size_matched,
                            price: open.price,
                            tag: OrderTag::Other(EXTERNAL_TAG.to_string()),
                        });
                        if inserted {
                            report.orders += 1;
                        }
                    }
                }
                Err(e) => warn!("[InventoryMM] {} open orders unavailable: {}", info.short_desc(), e),
            }

            match self.with_timeout(self.client.trade_history(&info.market_id)).await {
                Ok(fills) => {
                    for fill in fills {
                        if self.store.apply_fill(&fill).is_some() {
                            report.fills += 1;
                        }
                    }
                }
                Err(e) => warn!("[InventoryMM] {} trade history unavailable: {}", info.short_desc(), e),
            }
        }

        info!(
            "[InventoryMM] Hydrated {} orders and {} fills",
            report.orders, report.fills
        );
        report
    }

    /// Decode a raw feed payload, apply it and enqueue the touched markets.
    /// Returns how many markets were queued.
    pub fn ingest(&self, raw: &str) -> Result<usize, FeedError> {
        let events = parse_message(raw)?;
        Ok(self.apply_events(&events))
    }

    pub fn apply_events(&self, events: &[FeedEvent]) -> usize {
        let mut queued = 0;
        for event in events {
            for market_id in self.store.apply_event(event) {
                if self.store.markets.is_active(&market_id)
                    && self.runner.enqueue(&market_id) == Enqueue::Queued
                {
                    queued += 1;
                }
            }
        }
        queued
    }

    /// Queue a cycle for every active market
    pub fn enqueue_active(&self) -> usize {
        self.store
            .markets
            .active_markets()
            .iter()
            .filter(|m| self.runner.enqueue(&m.market_id) == Enqueue::Queued)
            .count()
    }

    pub fn log_status(&self) {
        let handle = self.runner.handle();
        info!(
            "[InventoryMM] Status: markets={} active={} orders={} books={} pending={} {}",
            self.store.markets.len(),
            self.store.markets.active_markets().len(),
            self.store.orders.len(),
            self.store.books.len(),
            handle.pending_count(),
            handle.stats().summary()
        );
    }

    /// Flush observe-mode snapshots, if recording
    pub fn flush_snapshots(&self) {
        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.flush() {
                warn!("[InventoryMM] Snapshot flush failed: {}", e);
            }
        }
    }

    /// Stop the workers after the queued cycles
    pub fn shutdown(self) {
        info!("[InventoryMM] Shutting down");
        self.flush_snapshots();
        self.runner.shutdown();
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T, ExecutionError>>,
    {
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::Timeout(self.config.request_timeout_ms)),
        }
    }
}
