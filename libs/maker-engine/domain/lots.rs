//! Lot pairing ledger
//!
//! One UP share plus one DOWN share always resolves to [`PAYOUT_CENTS`], so
//! pairing the cheapest unpaired UP lot with the cheapest unpaired DOWN lot
//! locks in `PAYOUT_CENTS - up - down` per share regardless of the outcome.
//! Whatever cannot be paired stays in a per-outcome min-heap and is the
//! market's open exposure.

use super::order::Outcome;
use super::price::{Cents, PAYOUT_CENTS};

/// Quantities at or below this are treated as zero
pub const LOT_EPSILON: f64 = 1e-12;

/// Highest price that still pairs with an opposite lot bought at `opposite`
/// for at least `profit_floor_cents`
pub fn hedge_cap(opposite: Cents, profit_floor_cents: Cents) -> Cents {
    PAYOUT_CENTS - opposite - profit_floor_cents
}

/// Remaining unpaired quantity from one fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lot {
    pub price: Cents,
    pub qty: f64,
}

// =============================================================================
// LotHeap
// =============================================================================

/// Binary min-heap of lots keyed by price, over a contiguous buffer
#[derive(Debug, Clone, Default)]
pub struct LotHeap {
    lots: Vec<Lot>,
}

impl LotHeap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Cheapest lot
    #[inline]
    pub fn peek(&self) -> Option<&Lot> {
        self.lots.first()
    }

    /// All held lots, in heap order
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Add a lot. Non-positive price or quantity is ignored.
    pub fn push(&mut self, price: Cents, qty: f64) {
        if qty <= 0.0 || price <= 0 {
            return;
        }
        self.lots.push(Lot { price, qty });
        self.sift_up(self.lots.len() - 1);
    }

    /// Take up to `want` from the top lot only.
    ///
    /// A partial take leaves the remainder on top; a full take removes the lot.
    /// Returns `(price, taken)`, or `None` when empty.
    pub fn pop_qty(&mut self, want: f64) -> Option<(Cents, f64)> {
        let top = self.lots.first_mut()?;
        let price = top.price;

        if want <= 0.0 {
            return Some((price, 0.0));
        }

        if want < top.qty - LOT_EPSILON {
            top.qty -= want;
            return Some((price, want));
        }

        // Residue below epsilon is dropped with the lot
        let got = top.qty.min(want);
        self.remove_top();
        Some((price, got))
    }

    fn remove_top(&mut self) {
        let last = self.lots.len() - 1;
        self.lots.swap(0, last);
        self.lots.pop();
        if !self.lots.is_empty() {
            self.sift_down(0);
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.lots[i].price >= self.lots[parent].price {
                break;
            }
            self.lots.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.lots.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;

            if left < n && self.lots[left].price < self.lots[smallest].price {
                smallest = left;
            }
            if right < n && self.lots[right].price < self.lots[smallest].price {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.lots.swap(i, smallest);
            i = smallest;
        }
    }
}

// =============================================================================
// LotLedger
// =============================================================================

/// Aggregate over one side's unpaired lots
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnpairedStats {
    pub qty: f64,
    /// Sum of price * qty, in cent-shares
    pub cost: f64,
    pub min_price: Option<Cents>,
    pub max_price: Option<Cents>,
}

impl UnpairedStats {
    pub fn avg_price(&self) -> Option<f64> {
        (self.qty > LOT_EPSILON).then(|| self.cost / self.qty)
    }
}

/// Per-market pairing state
#[derive(Debug, Clone, Default)]
pub struct LotLedger {
    up: LotHeap,
    down: LotHeap,
    paired_qty: f64,
    paired_profit_cents: f64,
}

impl LotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fill(&mut self, outcome: Outcome, price: Cents, qty: f64) {
        match outcome {
            Outcome::Up => self.record_fill_up(price, qty),
            Outcome::Down => self.record_fill_down(price, qty),
        }
    }

    pub fn record_fill_up(&mut self, price: Cents, qty: f64) {
        self.up.push(price, qty);
        self.pair();
    }

    pub fn record_fill_down(&mut self, price: Cents, qty: f64) {
        self.down.push(price, qty);
        self.pair();
    }

    fn pair(&mut self) {
        loop {
            let (top_up, top_down) = match (self.up.peek(), self.down.peek()) {
                (Some(u), Some(d)) => (u.qty, d.qty),
                _ => return,
            };

            let q = top_up.min(top_down);
            if q <= LOT_EPSILON {
                return;
            }

            let (Some((price_up, got_up)), Some((price_down, got_down))) =
                (self.up.pop_qty(q), self.down.pop_qty(q))
            else {
                return;
            };

            let q2 = got_up.min(got_down);
            if q2 <= LOT_EPSILON {
                return;
            }

            self.paired_qty += q2;
            self.paired_profit_cents += (PAYOUT_CENTS - price_up - price_down) as f64 * q2;
        }
    }

    /// Total shares matched so far
    pub fn paired_qty(&self) -> f64 {
        self.paired_qty
    }

    /// Profit locked in by pairing, in cents
    pub fn paired_profit_cents(&self) -> f64 {
        self.paired_profit_cents
    }

    fn heap(&self, outcome: Outcome) -> &LotHeap {
        match outcome {
            Outcome::Up => &self.up,
            Outcome::Down => &self.down,
        }
    }

    /// Price of the cheapest unpaired lot on one side
    pub fn cheapest_unpaired_price(&self, outcome: Outcome) -> Option<Cents> {
        self.heap(outcome).peek().map(|l| l.price)
    }

    /// Linear scan over one side's unpaired lots
    pub fn unpaired_stats(&self, outcome: Outcome) -> UnpairedStats {
        let mut stats = UnpairedStats::default();
        for lot in self.heap(outcome).lots() {
            stats.qty += lot.qty;
            stats.cost += lot.price as f64 * lot.qty;
            stats.min_price = Some(stats.min_price.map_or(lot.price, |p| p.min(lot.price)));
            stats.max_price = Some(stats.max_price.map_or(lot.price, |p| p.max(lot.price)));
        }
        stats
    }

    /// Highest price at which buying `outcome` still nets `profit_floor_cents`
    /// against the cheapest unpaired lot on the opposite side.
    ///
    /// `None` when the opposite side holds nothing unpaired.
    pub fn hedge_price_cap(&self, outcome: Outcome, profit_floor_cents: Cents) -> Option<Cents> {
        self.cheapest_unpaired_price(outcome.opposite())
            .map(|opp| hedge_cap(opp, profit_floor_cents))
    }
}
