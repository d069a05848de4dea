//! Close/hedge detection.
//!
//! When the book imbalance gets too large, or the market is about to
//! resolve, the engine considers buying the scarce side at the ask.

use tracing::debug;

use crate::application::strategies::inventory_mm::types::{DesiredOrder, SolverInput};
use crate::domain::{Outcome, MAX_PRICE_CENTS, MIN_PRICE_CENTS};

/// Why the close phase was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    /// `|net| >= hard_imbalance_threshold`
    Imbalance,
    /// `time_left <= close_only_secs`
    Expiry,
}

/// Result of evaluating the close phase
#[derive(Debug, Clone, PartialEq)]
pub struct CloseDecision {
    pub trigger: CloseTrigger,
    /// Side that needs buying to reduce `|net|`
    pub need: Outcome,
    /// Crossing order, if one improves worst-case P&L
    pub order: Option<DesiredOrder>,
}

/// Evaluate the close phase. `None` when neither trigger fires.
pub fn find_close_order(input: &SolverInput, net: f64) -> Option<CloseDecision> {
    let config = &input.config;

    let trigger = if input.time_left_secs <= config.close_only_secs {
        CloseTrigger::Expiry
    } else if net.abs() >= config.hard_imbalance_threshold {
        CloseTrigger::Imbalance
    } else {
        return None;
    };

    let need = if net < 0.0 { Outcome::Up } else { Outcome::Down };
    let size = net.abs().min(config.max_close_size);

    let decision = |order: Option<DesiredOrder>| {
        Some(CloseDecision {
            trigger,
            need,
            order,
        })
    };

    if size < config.min_order_size {
        return decision(None);
    }

    let ask = match input.book.best_ask_price(need) {
        Some(ask) if (MIN_PRICE_CENTS..=MAX_PRICE_CENTS).contains(&ask) => ask,
        _ => return decision(None),
    };

    // Imbalance closes must still pair profitably with held lots; expiry
    // closes take whatever the book offers
    if trigger == CloseTrigger::Imbalance && config.use_ledger_cap {
        if let Some(cap) = input.ledger.hedge_price_cap(need, config.profit_floor_cents) {
            if ask > cap {
                debug!(
                    "[Solver] Close {} @ {}c above hedge cap {}c",
                    need, ask, cap
                );
                return decision(None);
            }
        }
    }

    let current = input.inventory.min_pnl_cents();
    let simulated = input.inventory.simulate_min_pnl_cents(need, size, ask);

    if simulated > current {
        debug!(
            "[Solver] Close {} {:.2} @ {}c improves worst-case pnl {:.1} -> {:.1}",
            need, size, ask, current, simulated
        );
        decision(Some(DesiredOrder::close(need, input.token_id(need), ask, size)))
    } else {
        debug!(
            "[Solver] Close {} @ {}c rejected: pnl {:.1} -> {:.1}",
            need, ask, current, simulated
        );
        decision(None)
    }
}
