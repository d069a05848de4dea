//! Application Layer
//!
//! Decision engine, execution and the worker runtime.
//! This layer depends on domain and infrastructure layers.

pub mod strategies;

pub use strategies::inventory_mm::{
    solve, InventoryMMConfig, InventoryMMStrategy, Plan, RunnerHandle, SolverConfig,
    SolverInput, StrategyRunner,
};
