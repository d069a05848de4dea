//! One decision cycle for one market.
//!
//! Reads the current store state (never an enqueue-time copy), runs the
//! solver on value snapshots and executes the resulting plan.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::debug;

use super::components::executor::{ExecutionReport, PlanExecutor};
use super::components::solver::{solve, Decision};
use super::config::InventoryMMConfig;
use super::types::{BookSnapshot, InventorySnapshot, LedgerSnapshot, SolverInput};
use crate::domain::{MarketInfo, Outcome};
use crate::infrastructure::config::RunMode;
use crate::infrastructure::snapshot::SnapshotRecorder;
use crate::infrastructure::store::SharedMarketStore;

/// Why a cycle did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    NoMetadata,
    Expired,
    WarmingUp,
    IncompleteBook,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// Observe mode: top of book recorded, nothing traded
    Observed,
    Executed {
        decision: Decision,
        report: ExecutionReport,
    },
}

impl CycleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped(_))
    }
}

/// Work a runner worker performs for one dequeued market
pub trait MarketCycle: Send + Sync {
    fn run_cycle(&self, runtime: &Runtime, market_id: &str) -> CycleOutcome;
}

pub struct CycleContext {
    store: SharedMarketStore,
    executor: PlanExecutor,
    config: InventoryMMConfig,
    mode: RunMode,
    recorder: Option<Arc<SnapshotRecorder>>,
}

impl CycleContext {
    pub fn new(
        store: SharedMarketStore,
        executor: PlanExecutor,
        config: InventoryMMConfig,
        mode: RunMode,
        recorder: Option<Arc<SnapshotRecorder>>,
    ) -> Self {
        Self {
            store,
            executor,
            config,
            mode,
            recorder,
        }
    }

    /// Run one cycle as of `now`.
    pub fn run_at(&self, runtime: &Runtime, market_id: &str, now: DateTime<Utc>) -> CycleOutcome {
        let info = match self.check_market(market_id, now) {
            Ok(info) => info,
            Err(reason) => {
                debug!("[Cycle] market={} skipped: {:?}", market_id, reason);
                return CycleOutcome::Skipped(reason);
            }
        };

        let book = self.book_snapshot(&info);
        if !book.is_complete() {
            debug!("[Cycle] {} skipped: incomplete book", info.short_desc());
            return CycleOutcome::Skipped(SkipReason::IncompleteBook);
        }

        if self.mode == RunMode::Observe {
            if let Some(recorder) = &self.recorder {
                recorder.tick(&info.slug, now.timestamp(), book.up, book.down);
            }
            return CycleOutcome::Observed;
        }

        let input = self.build_input(&info, book, now);
        let (decision, plan) = solve(&input);
        debug!(
            "[Cycle] {} phase={:?} net={:.2} cancels={} places={}",
            info.short_desc(),
            decision.phase,
            decision.net,
            plan.cancel_count(),
            plan.place.len()
        );

        let report = self.executor.execute(runtime, &info.market_id, &plan);
        CycleOutcome::Executed { decision, report }
    }

    fn check_market(&self, market_id: &str, now: DateTime<Utc>) -> Result<MarketInfo, SkipReason> {
        if !self.store.markets.is_active(market_id) {
            return Err(SkipReason::Inactive);
        }
        let info = self.store.markets.get(market_id).ok_or(SkipReason::NoMetadata)?;
        if info.time_left_secs(now) <= 0 {
            return Err(SkipReason::Expired);
        }
        if info.elapsed_secs(now) <= self.config.warmup_secs {
            return Err(SkipReason::WarmingUp);
        }
        Ok(info)
    }

    fn book_snapshot(&self, info: &MarketInfo) -> BookSnapshot {
        BookSnapshot {
            up: self.store.books.best_bid_ask(&info.up_token_id).unwrap_or_default(),
            down: self.store.books.best_bid_ask(&info.down_token_id).unwrap_or_default(),
        }
    }

    /// Snapshot everything the solver reads for one market
    pub fn build_input(&self, info: &MarketInfo, book: BookSnapshot, now: DateTime<Utc>) -> SolverInput {
        let held = self.store.positions.market_positions(
            &info.market_id,
            &info.up_token_id,
            &info.down_token_id,
        );
        let size_avg = |outcome: Outcome| {
            let position = match outcome {
                Outcome::Up => held.up.as_ref(),
                Outcome::Down => held.down.as_ref(),
            };
            position.map_or((0.0, 0.0), |p| (p.size, p.avg_price_cents))
        };
        let (up_size, up_avg) = size_avg(Outcome::Up);
        let (down_size, down_avg) = size_avg(Outcome::Down);

        SolverInput {
            up_token_id: info.up_token_id.clone(),
            down_token_id: info.down_token_id.clone(),
            inventory: InventorySnapshot::new(up_size, up_avg, down_size, down_avg),
            book,
            ledger: LedgerSnapshot {
                cheapest_unpaired_up: held.cheapest_unpaired_up,
                cheapest_unpaired_down: held.cheapest_unpaired_down,
            },
            live_orders: self
                .store
                .orders
                .live_by_tag(&info.market_id, self.config.solver.dust_size),
            time_left_secs: info.time_left_secs(now),
            config: self.config.solver.clone(),
        }
    }
}

impl MarketCycle for CycleContext {
    fn run_cycle(&self, runtime: &Runtime, market_id: &str) -> CycleOutcome {
        self.run_at(runtime, market_id, Utc::now())
    }
}
