//! Components for the Inventory MM strategy.

pub mod executor;
pub mod solver;

pub use executor::{ExecutionReport, PlanExecutor};
pub use solver::{decide, solve, Decision, Phase};
