//! Raw input types for the solver.
//!
//! Everything here is a value copy taken from the shared stores, so the
//! solver can run (and simulate) without holding any lock.

use std::collections::BTreeMap;

use crate::domain::{hedge_cap, BestBidAsk, Cents, Order, OrderTag, Outcome, PAYOUT_CENTS};

/// Raw snapshot of our inventory for a token pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InventorySnapshot {
    pub up_size: f64,
    /// Average entry in cents
    pub up_avg_price: f64,
    pub down_size: f64,
    /// Average entry in cents
    pub down_avg_price: f64,
}

impl InventorySnapshot {
    pub fn new(up_size: f64, up_avg_price: f64, down_size: f64, down_avg_price: f64) -> Self {
        Self {
            up_size,
            up_avg_price,
            down_size,
            down_avg_price,
        }
    }

    /// Worst-case P&L in cents: what is guaranteed whichever side resolves.
    ///
    /// `min(up, down) * 100 - (up * up_avg + down * down_avg)`
    pub fn min_pnl_cents(&self) -> f64 {
        let pairs = self.up_size.min(self.down_size);
        let total_cost = self.up_size * self.up_avg_price + self.down_size * self.down_avg_price;
        pairs * PAYOUT_CENTS as f64 - total_cost
    }

    /// Copy of this snapshot with a buy fill applied
    pub fn with_fill(&self, outcome: Outcome, qty: f64, price: Cents) -> Self {
        let mut next = *self;
        if qty <= 0.0 {
            return next;
        }
        let (size, avg) = match outcome {
            Outcome::Up => (&mut next.up_size, &mut next.up_avg_price),
            Outcome::Down => (&mut next.down_size, &mut next.down_avg_price),
        };
        let new_size = *size + qty;
        *avg = (*avg * *size + price as f64 * qty) / new_size;
        *size = new_size;
        next
    }

    /// Worst-case P&L after a hypothetical fill
    pub fn simulate_min_pnl_cents(&self, outcome: Outcome, qty: f64, price: Cents) -> f64 {
        self.with_fill(outcome, qty, price).min_pnl_cents()
    }

    pub fn size(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Up => self.up_size,
            Outcome::Down => self.down_size,
        }
    }

    /// Minimum of both sides (complete pairs held)
    pub fn pairs_available(&self) -> f64 {
        self.up_size.min(self.down_size)
    }
}

/// Top of book for both tokens of a market
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookSnapshot {
    pub up: BestBidAsk,
    pub down: BestBidAsk,
}

impl BookSnapshot {
    pub fn side(&self, outcome: Outcome) -> &BestBidAsk {
        match outcome {
            Outcome::Up => &self.up,
            Outcome::Down => &self.down,
        }
    }

    pub fn best_ask_price(&self, outcome: Outcome) -> Option<Cents> {
        self.side(outcome).ask.map(|l| l.price)
    }

    pub fn best_bid_price(&self, outcome: Outcome) -> Option<Cents> {
        self.side(outcome).bid.map(|l| l.price)
    }

    /// All four levels present
    pub fn is_complete(&self) -> bool {
        self.up.bid.is_some() && self.up.ask.is_some() && self.down.bid.is_some() && self.down.ask.is_some()
    }
}

/// Cheapest unpaired lot per side from the market's ledger
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub cheapest_unpaired_up: Option<Cents>,
    pub cheapest_unpaired_down: Option<Cents>,
}

impl LedgerSnapshot {
    pub fn cheapest_unpaired(&self, outcome: Outcome) -> Option<Cents> {
        match outcome {
            Outcome::Up => self.cheapest_unpaired_up,
            Outcome::Down => self.cheapest_unpaired_down,
        }
    }

    /// Highest price for `outcome` that still clears the floor against the
    /// cheapest unpaired lot on the opposite side
    pub fn hedge_price_cap(&self, outcome: Outcome, profit_floor_cents: Cents) -> Option<Cents> {
        self.cheapest_unpaired(outcome.opposite())
            .map(|opp| hedge_cap(opp, profit_floor_cents))
    }
}

/// Live orders grouped by quoting intent
pub type LiveOrders = BTreeMap<OrderTag, Vec<Order>>;

/// Complete input for the solver - all raw types
#[derive(Debug, Clone)]
pub struct SolverInput {
    /// Token identifiers
    pub up_token_id: String,
    pub down_token_id: String,

    /// Our inventory
    pub inventory: InventorySnapshot,

    /// Current orderbook state
    pub book: BookSnapshot,

    /// Unpaired lot prices
    pub ledger: LedgerSnapshot,

    /// Our live orders (dust already filtered out)
    pub live_orders: LiveOrders,

    /// Seconds until market resolution
    pub time_left_secs: i64,

    /// Configuration
    pub config: SolverConfig,
}

impl SolverInput {
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Up => &self.up_token_id,
            Outcome::Down => &self.down_token_id,
        }
    }

    /// Remaining size resting on one token
    pub fn pending(&self, outcome: Outcome) -> f64 {
        let token = self.token_id(outcome);
        self.live_orders
            .values()
            .flatten()
            .filter(|o| o.asset_id == token)
            .map(Order::remaining)
            .sum()
    }

    /// `up - down` from filled inventory only
    pub fn inventory_net(&self) -> f64 {
        self.inventory.up_size - self.inventory.down_size
    }

    /// `(up + pending_up) - (down + pending_down)`
    pub fn net_imbalance(&self) -> f64 {
        (self.inventory.up_size + self.pending(Outcome::Up))
            - (self.inventory.down_size + self.pending(Outcome::Down))
    }
}

/// Solver configuration parameters
///
/// Every threshold the decision engine uses is tunable here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    // ═══════════════════════════════════════════════════════════════
    // PROFIT FLOOR
    // ═══════════════════════════════════════════════════════════════

    /// Minimum locked profit per UP+DOWN pair, in cents.
    /// Top-of-ladder bids always satisfy `bid_up + bid_down <= 100 - floor`.
    pub profit_floor_cents: Cents,

    /// Also cap each side's bid so that pairing it against the cheapest
    /// unpaired lot on the other side still clears the floor.
    pub use_ledger_cap: bool,

    // ═══════════════════════════════════════════════════════════════
    // CLOSE / HEDGE
    // ═══════════════════════════════════════════════════════════════

    /// |net| at or above which a crossing close order is considered
    pub hard_imbalance_threshold: f64,

    /// Seconds before resolution at which the market switches to close-only
    pub close_only_secs: i64,

    /// Largest single close order
    pub max_close_size: f64,

    // ═══════════════════════════════════════════════════════════════
    // MAKER LADDER
    // ═══════════════════════════════════════════════════════════════

    /// Exchange minimum order size
    pub min_order_size: f64,

    /// Shares of imbalance per tick of skew
    pub soft_imbalance_unit: f64,

    /// Skew cap in ticks
    pub max_skew_ticks: Cents,

    /// Size per ladder level; its length is the ladder depth
    pub ladder_sizes: Vec<f64>,

    // ═══════════════════════════════════════════════════════════════
    // RECONCILIATION
    // ═══════════════════════════════════════════════════════════════

    /// Requote a maker order once it drifts this many cents from target
    pub requote_delta: Cents,

    /// Orders with remaining size at or below this are ignored
    pub dust_size: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            profit_floor_cents: 2,
            use_ledger_cap: true,

            hard_imbalance_threshold: 30.0,
            close_only_secs: 60,
            max_close_size: 30.0,

            min_order_size: 5.0,
            soft_imbalance_unit: 10.0,
            max_skew_ticks: 3,
            ladder_sizes: vec![5.0, 5.0, 5.0, 5.0],

            requote_delta: 2,
            dust_size: 0.1,
        }
    }
}

impl SolverConfig {
    pub fn with_profit_floor(mut self, cents: Cents) -> Self {
        self.profit_floor_cents = cents;
        self
    }

    pub fn with_hard_imbalance_threshold(mut self, threshold: f64) -> Self {
        self.hard_imbalance_threshold = threshold;
        self
    }

    pub fn with_close_only_secs(mut self, secs: i64) -> Self {
        self.close_only_secs = secs;
        self
    }

    pub fn with_ladder_sizes(mut self, sizes: Vec<f64>) -> Self {
        self.ladder_sizes = sizes;
        self
    }

    pub fn with_requote_delta(mut self, cents: Cents) -> Self {
        self.requote_delta = cents;
        self
    }

    /// Price ceiling for `bid_up + bid_down`
    pub fn pair_cap(&self) -> Cents {
        PAYOUT_CENTS - self.profit_floor_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;

    fn order(asset: &str, tag: OrderTag, original: f64, matched: f64) -> Order {
        Order {
            id: format!("{}-{}", asset, tag),
            market_id: "m".into(),
            asset_id: asset.into(),
            original_size: original,
            matched_size: matched,
            price: 40,
            tag,
        }
    }

    fn input(inventory: InventorySnapshot, live: Vec<Order>) -> SolverInput {
        let mut live_orders = LiveOrders::new();
        for o in live {
            live_orders.entry(o.tag.clone()).or_default().push(o);
        }
        SolverInput {
            up_token_id: "up".into(),
            down_token_id: "down".into(),
            inventory,
            book: BookSnapshot::default(),
            ledger: LedgerSnapshot::default(),
            live_orders,
            time_left_secs: 600,
            config: SolverConfig::default(),
        }
    }

    #[test]
    fn test_min_pnl_one_sided() {
        let inv = InventorySnapshot::new(10.0, 40.0, 0.0, 0.0);
        assert!((inv.min_pnl_cents() - (-400.0)).abs() < 1e-9);
    }

    #[test]
    fn test_simulated_close_improves_pnl() {
        let inv = InventorySnapshot::new(10.0, 40.0, 0.0, 0.0);
        let simulated = inv.simulate_min_pnl_cents(Outcome::Down, 10.0, 55);
        assert!((simulated - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_simulation_reflects_new_state() {
        let inv = InventorySnapshot::new(10.0, 40.0, 10.0, 50.0);
        assert!((inv.min_pnl_cents() - 100.0).abs() < 1e-9);

        // Adding to the long side only adds cost
        let simulated = inv.simulate_min_pnl_cents(Outcome::Up, 5.0, 60);
        assert!((simulated - (-200.0)).abs() < 1e-9);
        // Original untouched
        assert_eq!(inv.up_size, 10.0);
    }

    #[test]
    fn test_with_fill_weighted_average() {
        let inv = InventorySnapshot::new(10.0, 40.0, 0.0, 0.0).with_fill(Outcome::Up, 10.0, 50);
        assert_eq!(inv.up_size, 20.0);
        assert!((inv.up_avg_price - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_net_includes_pending() {
        let inv = InventorySnapshot::new(20.0, 40.0, 5.0, 50.0);
        let live = vec![
            order("up", OrderTag::ladder(Outcome::Up, 0), 10.0, 4.0),
            order("down", OrderTag::ladder(Outcome::Down, 0), 10.0, 0.0),
            order("down", OrderTag::ladder(Outcome::Down, 1), 5.0, 0.0),
        ];
        let input = input(inv, live);
        assert!((input.pending(Outcome::Up) - 6.0).abs() < 1e-9);
        assert!((input.pending(Outcome::Down) - 15.0).abs() < 1e-9);
        assert!((input.net_imbalance() - (26.0 - 20.0)).abs() < 1e-9);
        assert!((input.inventory_net() - (20.0 - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_book_snapshot_completeness() {
        let level = |price| Some(Level { price, size: 1.0 });
        let mut book = BookSnapshot::default();
        assert!(!book.is_complete());
        book.up = BestBidAsk { bid: level(40), ask: level(41) };
        book.down = BestBidAsk { bid: level(58), ask: None };
        assert!(!book.is_complete());
        book.down.ask = level(59);
        assert!(book.is_complete());
        assert_eq!(book.best_ask_price(Outcome::Down), Some(59));
        assert_eq!(book.best_bid_price(Outcome::Up), Some(40));
    }

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.pair_cap(), 98);
        assert_eq!(config.ladder_sizes.len(), 4);
        assert_eq!(config.min_order_size, 5.0);
    }
}
