//! Types for the Inventory MM strategy.

pub mod input;
mod order;
mod output;

pub use input::{
    BookSnapshot, InventorySnapshot, LedgerSnapshot, LiveOrders, SolverConfig, SolverInput,
};
pub use order::DesiredOrder;
pub use output::Plan;
