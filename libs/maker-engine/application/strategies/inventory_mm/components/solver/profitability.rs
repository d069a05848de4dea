//! Profit-floor enforcement for maker bids.
//!
//! If both top-of-ladder bids fill, the pair must still lock in at least
//! `profit_floor_cents`:
//!
//! - `bid_up + bid_down <= 100 - floor`
//! - optionally, `bid_x <= 100 - cheapest_unpaired_opposite - floor`, so a fill
//!   pairs profitably against inventory we already hold.

use tracing::debug;

use crate::application::strategies::inventory_mm::types::LedgerSnapshot;
use crate::domain::{Cents, Outcome, MIN_PRICE_CENTS};

/// Cap each side against the cheapest unpaired lot on the other side.
///
/// A side whose cap falls below the minimum price is dropped.
pub fn apply_ledger_cap(
    up: Option<Cents>,
    down: Option<Cents>,
    ledger: &LedgerSnapshot,
    profit_floor_cents: Cents,
) -> (Option<Cents>, Option<Cents>) {
    let cap = |bid: Option<Cents>, outcome: Outcome| -> Option<Cents> {
        let bid = bid?;
        match ledger.hedge_price_cap(outcome, profit_floor_cents) {
            Some(max_bid) => {
                if max_bid < MIN_PRICE_CENTS {
                    debug!(
                        "[Profitability] {} dropped: unpaired {} lots leave no room (cap {}c)",
                        outcome,
                        outcome.opposite(),
                        max_bid
                    );
                    None
                } else {
                    Some(bid.min(max_bid))
                }
            }
            None => Some(bid),
        }
    };

    (cap(up, Outcome::Up), cap(down, Outcome::Down))
}

/// Reduce a bid pair until `up + down <= cap`.
///
/// The excess comes off the over-held side first (`net > 0` means Up is
/// over-held), never taking it below 1c; any remainder comes off the other
/// side. When balanced the excess is split, Down giving the odd cent.
pub fn enforce_profit_floor(up: Cents, down: Cents, net: f64, cap: Cents) -> (Cents, Cents) {
    let excess = up + down - cap;
    if excess <= 0 {
        return (up, down);
    }

    let take_from = |price: Cents, want: Cents| -> Cents { want.min(price - MIN_PRICE_CENTS).max(0) };

    let (mut up, mut down) = (up, down);

    if net > 0.0 {
        let t = take_from(up, excess);
        up -= t;
        down -= take_from(down, excess - t);
    } else if net < 0.0 {
        let t = take_from(down, excess);
        down -= t;
        up -= take_from(up, excess - t);
    } else {
        let from_down = (excess + 1) / 2;
        let t = take_from(down, from_down);
        down -= t;
        let u = take_from(up, excess - t);
        up -= u;
        down -= take_from(down, excess - t - u);
    }

    debug!(
        "[Profitability] Floor cap {}c: excess {} -> up={}c down={}c",
        cap, excess, up, down
    );
    (up, down)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_excess_unchanged() {
        assert_eq!(enforce_profit_floor(40, 55, 0.0, 98), (40, 55));
        assert_eq!(enforce_profit_floor(40, 58, 10.0, 98), (40, 58));
    }

    #[test]
    fn test_balanced_split_takes_larger_half_from_down() {
        assert_eq!(enforce_profit_floor(40, 58, 0.0, 96), (39, 57));
        assert_eq!(enforce_profit_floor(40, 59, 0.0, 96), (39, 57));
        assert_eq!(enforce_profit_floor(60, 40, 0.0, 97), (59, 38));
        assert_eq!(enforce_profit_floor(70, 29, 0.0, 96), (69, 27));
        // Down at 2c can only give 1c; Up covers the rest
        assert_eq!(enforce_profit_floor(97, 2, 0.0, 95), (94, 1));
    }

    #[test]
    fn test_over_held_side_pays_first() {
        // Long Up: all of the excess comes off Up
        assert_eq!(enforce_profit_floor(50, 50, 20.0, 96), (46, 50));
        // Long Down
        assert_eq!(enforce_profit_floor(50, 50, -20.0, 96), (50, 46));
    }

    #[test]
    fn test_remainder_spills_to_other_side() {
        // Up can only give 2c before hitting 1c
        assert_eq!(enforce_profit_floor(3, 98, 5.0, 96), (1, 95));
    }

    #[test]
    fn test_floor_never_goes_below_one_cent() {
        let (up, down) = enforce_profit_floor(99, 99, 0.0, 2);
        assert_eq!((up, down), (1, 1));
    }

    #[test]
    fn test_ledger_cap() {
        let ledger = LedgerSnapshot {
            cheapest_unpaired_up: Some(60),
            cheapest_unpaired_down: None,
        };
        // Down is capped at 100 - 60 - 2 = 38; Up has nothing to pair against
        assert_eq!(apply_ledger_cap(Some(45), Some(50), &ledger, 2), (Some(45), Some(38)));
        assert_eq!(apply_ledger_cap(Some(45), Some(30), &ledger, 2), (Some(45), Some(30)));
    }

    #[test]
    fn test_ledger_cap_drops_side_without_room() {
        let ledger = LedgerSnapshot {
            cheapest_unpaired_up: None,
            cheapest_unpaired_down: Some(98),
        };
        assert_eq!(apply_ledger_cap(Some(10), Some(10), &ledger, 2), (None, Some(10)));
        assert_eq!(apply_ledger_cap(None, None, &ledger, 2), (None, None));
    }
}
