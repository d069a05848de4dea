//! Position store
//!
//! Per-token positions and per-market lot ledgers share one lock, so a fill
//! updates both in the same critical section. Fills for tokens whose market
//! is not registered yet are parked and replayed into the ledger once it is.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Cents, Fill, LotLedger, Outcome, Position};

/// Trade ids remembered for de-duplication
const MAX_SEEN_TRADES: usize = 10_000;

/// Fills kept while waiting for their market
const MAX_UNROUTED_FILLS: usize = 1_000;

/// Result of recording a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Applied,
    Duplicate,
    Invalid,
}

/// Consistent view of one market's holdings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketPositions {
    pub up: Option<Position>,
    pub down: Option<Position>,
    pub cheapest_unpaired_up: Option<Cents>,
    pub cheapest_unpaired_down: Option<Cents>,
    pub paired_qty: f64,
    pub paired_profit_cents: f64,
}

#[derive(Debug, Default)]
struct PositionState {
    positions: HashMap<String, Position>,
    ledgers: HashMap<String, LotLedger>,
    seen_trade_ids: HashSet<String>,
    seen_trade_ids_order: VecDeque<String>,
    /// Fills without a known market, in arrival order
    unrouted: VecDeque<Fill>,
}

impl PositionState {
    fn remember_trade(&mut self, trade_id: &str) -> bool {
        if !self.seen_trade_ids.insert(trade_id.to_string()) {
            return false;
        }
        self.seen_trade_ids_order.push_back(trade_id.to_string());
        while self.seen_trade_ids_order.len() > MAX_SEEN_TRADES {
            if let Some(old) = self.seen_trade_ids_order.pop_front() {
                self.seen_trade_ids.remove(&old);
            }
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct PositionStore {
    inner: Mutex<PositionState>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a buy fill.
    ///
    /// `outcome` routes the fill into the market's lot ledger. When the token's
    /// market is unknown the position is updated and the fill is parked for
    /// [`adopt_market`](Self::adopt_market).
    pub fn record_fill(&self, fill: &Fill, outcome: Option<Outcome>) -> FillOutcome {
        if fill.size <= 0.0 || !fill.size.is_finite() || fill.price <= 0 {
            debug!("[Positions] Ignoring invalid fill {:?}", fill);
            return FillOutcome::Invalid;
        }

        let mut state = self.inner.lock();

        if let Some(trade_id) = &fill.trade_id {
            if !state.remember_trade(trade_id) {
                debug!("[Positions] Duplicate trade {}", trade_id);
                return FillOutcome::Duplicate;
            }
        }

        let position = state
            .positions
            .entry(fill.asset_id.clone())
            .or_insert_with(|| Position::new(&fill.asset_id, &fill.market_id));
        position.apply_buy(fill.size, fill.price);
        let (size, avg) = (position.size, position.avg_price_cents);

        match outcome {
            Some(outcome) => state
                .ledgers
                .entry(fill.market_id.clone())
                .or_default()
                .record_fill(outcome, fill.price, fill.size),
            None => {
                state.unrouted.push_back(fill.clone());
                if state.unrouted.len() > MAX_UNROUTED_FILLS {
                    if let Some(dropped) = state.unrouted.pop_front() {
                        warn!("[Positions] Dropping unrouted fill for {}", dropped.asset_id);
                    }
                }
            }
        }

        info!(
            "[Positions] Fill {} {:.2} @ {}c -> size={:.2} avg={:.2}c",
            outcome.map(|o| o.as_str()).unwrap_or("?"),
            fill.size,
            fill.price,
            size,
            avg
        );
        FillOutcome::Applied
    }

    pub fn position(&self, asset_id: &str) -> Option<Position> {
        self.inner.lock().positions.get(asset_id).cloned()
    }

    pub fn ledger(&self, market_id: &str) -> Option<LotLedger> {
        self.inner.lock().ledgers.get(market_id).cloned()
    }

    /// Positions and ledger figures for one market, read under one lock
    pub fn market_positions(&self, market_id: &str, up_token: &str, down_token: &str) -> MarketPositions {
        let state = self.inner.lock();
        let ledger = state.ledgers.get(market_id);
        MarketPositions {
            up: state.positions.get(up_token).cloned(),
            down: state.positions.get(down_token).cloned(),
            cheapest_unpaired_up: ledger.and_then(|l| l.cheapest_unpaired_price(Outcome::Up)),
            cheapest_unpaired_down: ledger.and_then(|l| l.cheapest_unpaired_price(Outcome::Down)),
            paired_qty: ledger.map(LotLedger::paired_qty).unwrap_or(0.0),
            paired_profit_cents: ledger.map(LotLedger::paired_profit_cents).unwrap_or(0.0),
        }
    }

    /// Attach a newly registered market's tokens: positions take its id and
    /// parked fills are replayed into its ledger. Returns the fills replayed.
    pub fn adopt_market(&self, market_id: &str, up_token: &str, down_token: &str) -> usize {
        let mut state = self.inner.lock();
        for token in [up_token, down_token] {
            if let Some(position) = state.positions.get_mut(token) {
                position.market_id = market_id.to_string();
            }
        }

        let outcome_of = |asset_id: &str| {
            if asset_id == up_token {
                Some(Outcome::Up)
            } else if asset_id == down_token {
                Some(Outcome::Down)
            } else {
                None
            }
        };

        let parked = std::mem::take(&mut state.unrouted);
        let mut replayed = 0;
        for fill in parked {
            match outcome_of(&fill.asset_id) {
                Some(outcome) => {
                    state
                        .ledgers
                        .entry(market_id.to_string())
                        .or_default()
                        .record_fill(outcome, fill.price, fill.size);
                    replayed += 1;
                }
                None => state.unrouted.push_back(fill),
            }
        }
        if replayed > 0 {
            debug!("[Positions] Replayed {} parked fills into {}", replayed, market_id);
        }
        replayed
    }

    /// Drop a market's positions and ledger
    pub fn remove_market(&self, market_id: &str) {
        let mut state = self.inner.lock();
        state.positions.retain(|_, p| p.market_id != market_id);
        state.ledgers.remove(market_id);
    }
}
