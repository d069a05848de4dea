//! Inventory MM Strategy
//!
//! Inventory-balanced market making for Up/Down binary markets.

mod config;
mod cycle;
mod runner;
mod strategy;
pub mod components;
pub mod types;

// Re-exports for convenience
pub use config::{InventoryMMConfig, MarketSpec};
pub use cycle::{CycleContext, CycleOutcome, MarketCycle, SkipReason};
pub use runner::{Enqueue, RunnerHandle, RunnerStats, StrategyRunner};
pub use strategy::{DiscoveryReport, HydrationReport, InventoryMMStrategy};
pub use components::{decide, solve, Decision, ExecutionReport, Phase, PlanExecutor};
pub use types::{
    BookSnapshot, DesiredOrder, InventorySnapshot, LedgerSnapshot, LiveOrders, Plan,
    SolverConfig, SolverInput,
};
