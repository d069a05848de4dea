//! Core solver function.

use tracing::debug;

use crate::application::strategies::inventory_mm::types::{DesiredOrder, Plan, SolverInput};
use crate::domain::Outcome;

use super::diff::reconcile;
use super::quotes::{build_ladder, calculate_maker_bids};
use super::taker::{find_close_order, CloseTrigger};

/// Which branch of the decision produced the desired set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A close/hedge order is wanted; nothing else is quoted
    Closing,
    /// Inside the pre-resolution window with nothing worth closing
    CloseOnly,
    /// Imbalance trigger fired but no close helps: quote the scarce side only
    Throttled { suppressed: Outcome },
    /// Normal two-sided ladder
    Quoting,
}

/// Desired quote set for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub phase: Phase,
    pub net: f64,
    pub orders: Vec<DesiredOrder>,
}

/// Decide the desired quote set. Pure: no shared state is touched.
///
/// The close trigger and close size read filled inventory only, so the
/// phase cannot flip because of our own resting orders. Maker skew reads the
/// net including pending size.
pub fn decide(input: &SolverInput) -> Decision {
    let net = input.net_imbalance();

    let mut suppressed = None;
    if let Some(close) = find_close_order(input, input.inventory_net()) {
        match (close.order, close.trigger) {
            (Some(order), _) => {
                return Decision {
                    phase: Phase::Closing,
                    net,
                    orders: vec![order],
                };
            }
            (None, CloseTrigger::Expiry) => {
                return Decision {
                    phase: Phase::CloseOnly,
                    net,
                    orders: Vec::new(),
                };
            }
            (None, CloseTrigger::Imbalance) => {
                suppressed = Some(close.need.opposite());
            }
        }
    }

    let bids = calculate_maker_bids(input, net);
    let mut orders = Vec::new();
    for outcome in Outcome::BOTH {
        if suppressed == Some(outcome) {
            continue;
        }
        if let Some(top) = bids.get(outcome) {
            orders.extend(build_ladder(outcome, input.token_id(outcome), top, &input.config));
        }
    }

    let phase = match suppressed {
        Some(outcome) => Phase::Throttled { suppressed: outcome },
        None => Phase::Quoting,
    };

    debug!(
        "[Solver] phase={:?} net={:.2} desired={}",
        phase,
        net,
        orders.len()
    );

    Decision { phase, net, orders }
}

/// Main solver function: decide, then reconcile against live orders.
pub fn solve(input: &SolverInput) -> (Decision, Plan) {
    let decision = decide(input);
    let plan = reconcile(&decision.orders, &input.live_orders, &input.book, &input.config);
    (decision, plan)
}
