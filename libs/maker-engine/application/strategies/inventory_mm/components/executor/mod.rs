//! Executor - applies a plan through the execution client.

mod executor;
mod report;

pub use executor::PlanExecutor;
pub use report::ExecutionReport;
