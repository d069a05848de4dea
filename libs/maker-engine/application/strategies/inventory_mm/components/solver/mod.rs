//! Solver - pure functions that turn a market snapshot into a plan.
//!
//! - Close/hedge: cross the spread on the scarce side when imbalance or
//!   time-to-resolution demands it, only if worst-case P&L improves
//! - Maker ladder: seeded inside the spread, skewed by inventory, capped by
//!   the profit floor
//! - Reconcile: diff desired quotes against live orders per tag

mod core;
mod diff;
mod profitability;
mod quotes;
mod taker;

pub use self::core::{decide, solve, Decision, Phase};
pub use diff::reconcile;
pub use profitability::{apply_ledger_cap, enforce_profit_floor};
pub use quotes::{build_ladder, calculate_maker_bids, skew_ticks, MakerBids};
pub use taker::{find_close_order, CloseDecision, CloseTrigger};
