//! Orderbook domain entities
//!
//! Fixed-grid orderbook: each side is a 101-slot quantity array indexed by
//! price in cents, with the best level cached.

use super::price::{parse_price_cents, parse_size, Cents, PriceError, GRID_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Price Level - Wire representation
// =============================================================================

/// Price level as delivered by the market data feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: String,
    pub size: String,
}

impl PriceLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }

    /// Parse into grid coordinates.
    pub fn parse(&self) -> Result<(Cents, f64), PriceError> {
        Ok((parse_price_cents(&self.price)?, parse_size(&self.size)?))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("price {0} outside the book grid")]
    PriceOutOfGrid(Cents),

    #[error("invalid size {0}")]
    InvalidSize(f64),

    #[error("no snapshot yet for {0}")]
    NoSnapshot(String),
}

/// Which side of a book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    /// Map the exchange's aggressor side: resting BUY orders are bids.
    pub fn from_wire(side: &str) -> Option<Self> {
        match side.to_uppercase().as_str() {
            "BUY" => Some(BookSide::Bid),
            "SELL" => Some(BookSide::Ask),
            _ => None,
        }
    }
}

/// A populated price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Cents,
    pub size: f64,
}

/// Top of book. Either side may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BestBidAsk {
    pub bid: Option<Level>,
    pub ask: Option<Level>,
}

// =============================================================================
// GridSide - One side of the orderbook
// =============================================================================

#[derive(Debug, Clone)]
struct GridSide {
    qty: [f64; GRID_SIZE],
    /// Cached best slot: highest populated for bids, lowest for asks
    best: Option<usize>,
    is_bid: bool,
}

impl GridSide {
    fn new(is_bid: bool) -> Self {
        Self {
            qty: [0.0; GRID_SIZE],
            best: None,
            is_bid,
        }
    }

    #[inline]
    fn improves(&self, idx: usize) -> bool {
        match self.best {
            None => true,
            Some(best) if self.is_bid => idx > best,
            Some(best) => idx < best,
        }
    }

    fn scan(&self) -> Option<usize> {
        if self.is_bid {
            (0..GRID_SIZE).rev().find(|&i| self.qty[i] > 0.0)
        } else {
            (0..GRID_SIZE).find(|&i| self.qty[i] > 0.0)
        }
    }

    fn set(&mut self, idx: usize, size: f64) {
        self.qty[idx] = size;

        if size > 0.0 {
            if self.improves(idx) {
                self.best = Some(idx);
            }
        } else if self.best == Some(idx) {
            self.best = self.scan();
        }
    }

    fn replace(&mut self, levels: &[PriceLevel]) -> usize {
        self.qty = [0.0; GRID_SIZE];
        let mut skipped = 0;

        for level in levels {
            match level.parse() {
                Ok((price, size)) => self.qty[price as usize] = size,
                Err(e) => {
                    skipped += 1;
                    debug!("[Orderbook] Skipping malformed level {:?}: {}", level, e);
                }
            }
        }

        self.best = self.scan();
        skipped
    }

    fn best_level(&self) -> Option<Level> {
        self.best.map(|i| Level {
            price: i as Cents,
            size: self.qty[i],
        })
    }
}

// =============================================================================
// OrderBook - Complete book for one token
// =============================================================================

/// Orderbook for one outcome token
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub asset_id: String,
    bids: GridSide,
    asks: GridSide,
}

impl OrderBook {
    /// Create a new empty orderbook
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            bids: GridSide::new(true),
            asks: GridSide::new(false),
        }
    }

    /// Replace both sides with a full snapshot.
    ///
    /// Malformed levels are skipped individually. Returns how many were skipped.
    pub fn apply_snapshot(&mut self, bids: &[PriceLevel], asks: &[PriceLevel]) -> usize {
        self.bids.replace(bids) + self.asks.replace(asks)
    }

    /// Set one slot to an absolute size.
    pub fn apply_level_update(
        &mut self,
        side: BookSide,
        price: Cents,
        size: f64,
    ) -> Result<(), BookError> {
        if price < 0 || price as usize >= GRID_SIZE {
            return Err(BookError::PriceOutOfGrid(price));
        }
        if !size.is_finite() || size < 0.0 {
            return Err(BookError::InvalidSize(size));
        }

        let idx = price as usize;
        match side {
            BookSide::Bid => self.bids.set(idx, size),
            BookSide::Ask => self.asks.set(idx, size),
        }
        Ok(())
    }

    /// Best bid and ask from the cache.
    #[inline]
    pub fn best_bid_ask(&self) -> BestBidAsk {
        BestBidAsk {
            bid: self.bids.best_level(),
            ask: self.asks.best_level(),
        }
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.best_level()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.best_level()
    }

    /// Quantity resting at a slot
    pub fn size_at(&self, side: BookSide, price: Cents) -> f64 {
        if price < 0 || price as usize >= GRID_SIZE {
            return 0.0;
        }
        match side {
            BookSide::Bid => self.bids.qty[price as usize],
            BookSide::Ask => self.asks.qty[price as usize],
        }
    }

    /// Best price by full linear scan, ignoring the cache.
    pub fn scan_best(&self, side: BookSide) -> Option<Cents> {
        let grid = match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        };
        grid.scan().map(|i| i as Cents)
    }

    /// Format top of book for logging
    pub fn format_summary(&self) -> String {
        let fmt = |l: Option<Level>| {
            l.map(|l| format!("{}c ({:.2})", l.price, l.size))
                .unwrap_or_else(|| "N/A".to_string())
        };
        format!("Bid: {} | Ask: {}", fmt(self.best_bid()), fmt(self.best_ask()))
    }
}

// =============================================================================
// Tests
// =============================================================================
