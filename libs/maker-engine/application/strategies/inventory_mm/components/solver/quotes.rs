//! Maker quote calculation.
//!
//! Seed -> inventory skew -> clamp -> ledger cap -> profit floor -> clamp,
//! then a fixed-size ladder below each top bid.

use tracing::debug;

use super::profitability::{apply_ledger_cap, enforce_profit_floor};
use crate::application::strategies::inventory_mm::types::{DesiredOrder, SolverConfig, SolverInput};
use crate::domain::{BestBidAsk, Cents, Outcome, MIN_PRICE_CENTS};

/// Top-of-ladder bid per side. `None` means the side is not quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MakerBids {
    pub up: Option<Cents>,
    pub down: Option<Cents>,
}

impl MakerBids {
    pub fn get(&self, outcome: Outcome) -> Option<Cents> {
        match outcome {
            Outcome::Up => self.up,
            Outcome::Down => self.down,
        }
    }
}

/// Clamp into `[1, ask - 1]`
#[inline]
fn clamp_below_ask(price: Cents, ask: Cents) -> Cents {
    price.clamp(MIN_PRICE_CENTS, ask - 1)
}

/// Join one tick above the best bid, never crossing the ask.
fn seed_bid(top: &BestBidAsk) -> Option<(Cents, Cents)> {
    let bid = top.bid?.price;
    let ask = top.ask?.price;
    if ask <= MIN_PRICE_CENTS {
        return None;
    }
    Some((clamp_below_ask(bid + 1, ask), ask))
}

/// Ticks of skew for a given imbalance
pub fn skew_ticks(net: f64, config: &SolverConfig) -> Cents {
    if config.soft_imbalance_unit <= 0.0 {
        return 0;
    }
    let ticks = (net.abs() / config.soft_imbalance_unit).floor();
    (ticks as Cents).clamp(0, config.max_skew_ticks.max(0))
}

/// Compute both top-of-ladder bids.
pub fn calculate_maker_bids(input: &SolverInput, net: f64) -> MakerBids {
    let config = &input.config;

    let up_seed = seed_bid(&input.book.up);
    let down_seed = seed_bid(&input.book.down);

    // Skew: lower the over-held side, raise the scarce side
    let skew = skew_ticks(net, config);
    let (up_shift, down_shift) = if net > 0.0 {
        (-skew, skew)
    } else if net < 0.0 {
        (skew, -skew)
    } else {
        (0, 0)
    };

    let mut up = up_seed.map(|(bid, ask)| clamp_below_ask(bid + up_shift, ask));
    let mut down = down_seed.map(|(bid, ask)| clamp_below_ask(bid + down_shift, ask));

    if config.use_ledger_cap {
        (up, down) = apply_ledger_cap(up, down, &input.ledger, config.profit_floor_cents);
    }

    if let (Some(u), Some(d)) = (up, down) {
        let (u, d) = enforce_profit_floor(u, d, net, config.pair_cap());
        up = Some(u);
        down = Some(d);
    }

    // Final clamp on the values actually emitted
    let up = up.zip(up_seed).map(|(bid, (_, ask))| clamp_below_ask(bid, ask));
    let down = down.zip(down_seed).map(|(bid, (_, ask))| clamp_below_ask(bid, ask));

    debug!(
        "[Quotes] net={:.2} skew={} -> up={:?} down={:?}",
        net, skew, up, down
    );

    MakerBids { up, down }
}

/// Fixed-size ladder below `top`: level `i` rests at `top - i`.
pub fn build_ladder(outcome: Outcome, token_id: &str, top: Cents, config: &SolverConfig) -> Vec<DesiredOrder> {
    config
        .ladder_sizes
        .iter()
        .enumerate()
        .map_while(|(level, &size)| {
            let price = top - level as Cents;
            (price >= MIN_PRICE_CENTS).then(|| DesiredOrder::ladder(outcome, token_id, price, size, level as u8))
        })
        .collect()
}
