//! Strategies

pub mod inventory_mm;

pub use inventory_mm::InventoryMMStrategy;
