//! Position entity
//!
//! Buy-only running size and weighted-average entry price for one token.

use super::price::Cents;
use serde::{Deserialize, Serialize};

/// Epsilon for floating point comparisons
pub const POSITION_EPSILON: f64 = 1e-9;

/// One of our buy fills
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    /// Exchange trade id, used for de-duplication when present
    pub trade_id: Option<String>,
    pub asset_id: String,
    pub market_id: String,
    pub price: Cents,
    pub size: f64,
}

/// Holdings in a single token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset_id: String,
    pub market_id: String,
    pub size: f64,
    /// Volume-weighted average entry price in cents
    pub avg_price_cents: f64,
    /// Number of fills applied
    pub fill_count: u64,
}

impl Position {
    pub fn new(asset_id: impl Into<String>, market_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            market_id: market_id.into(),
            size: 0.0,
            avg_price_cents: 0.0,
            fill_count: 0,
        }
    }

    /// Apply a buy fill. Non-positive quantities are ignored.
    pub fn apply_buy(&mut self, qty: f64, price: Cents) {
        if qty <= 0.0 || !qty.is_finite() {
            return;
        }
        let new_size = self.size + qty;
        self.avg_price_cents =
            (self.avg_price_cents * self.size + price as f64 * qty) / new_size;
        self.size = new_size;
        self.fill_count += 1;
    }

    /// Total cost basis in cent-shares
    pub fn cost_cents(&self) -> f64 {
        self.size * self.avg_price_cents
    }

    pub fn is_flat(&self) -> bool {
        self.size.abs() < POSITION_EPSILON
    }
}
