//! Up/Down Maker Engine
//!
//! Inventory-balanced market making on binary Up/Down markets: local order
//! books, fill accounting, a pure decision engine and a worker pool that
//! reconciles live orders against it.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use application::strategies::inventory_mm::{
    CycleContext, CycleOutcome, Decision, DiscoveryReport, HydrationReport, InventoryMMConfig,
    InventoryMMStrategy, MarketCycle, MarketSpec, Phase, Plan, SolverConfig, SolverInput,
    StrategyRunner,
};
pub use domain::{BestBidAsk, Cents, Fill, LotLedger, MarketInfo, OrderBook, OrderTag, Outcome};
pub use infrastructure::{
    init_tracing, EngineConfig, ExecutionClient, GammaClient, MarketMetadataProvider,
    MarketStore, PaperExecutionClient, RunMode, SharedMarketStore,
};
pub use utils::{Heartbeat, ShutdownManager};
