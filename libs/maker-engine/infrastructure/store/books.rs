//! Book store
//!
//! One [`OrderBook`] per token behind a single reader/writer lock. Writers
//! hold it only for the array mutation.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{BestBidAsk, BookError, BookSide, Cents, OrderBook, PriceLevel};

#[derive(Debug, Default)]
pub struct BookStore {
    books: RwLock<HashMap<String, OrderBook>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a token's book. Returns how many levels were skipped as malformed.
    pub fn apply_snapshot(&self, asset_id: &str, bids: &[PriceLevel], asks: &[PriceLevel]) -> usize {
        let mut books = self.books.write();
        let book = books
            .entry(asset_id.to_string())
            .or_insert_with(|| OrderBook::new(asset_id));
        let skipped = book.apply_snapshot(bids, asks);
        if skipped > 0 {
            debug!("[Books] {} snapshot: skipped {} malformed levels", asset_id, skipped);
        }
        skipped
    }

    /// Set one level to an absolute size. Tokens without a snapshot are
    /// rejected; a handful of deltas is not a book.
    pub fn apply_level_update(
        &self,
        asset_id: &str,
        side: BookSide,
        price: Cents,
        size: f64,
    ) -> Result<(), BookError> {
        let mut books = self.books.write();
        match books.get_mut(asset_id) {
            Some(book) => book.apply_level_update(side, price, size),
            None => Err(BookError::NoSnapshot(asset_id.to_string())),
        }
    }

    /// Top of book, `None` if the token has never been seen
    pub fn best_bid_ask(&self, asset_id: &str) -> Option<BestBidAsk> {
        self.books.read().get(asset_id).map(OrderBook::best_bid_ask)
    }

    /// Copy of a token's full book
    pub fn book(&self, asset_id: &str) -> Option<OrderBook> {
        self.books.read().get(asset_id).cloned()
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.books.read().contains_key(asset_id)
    }

    pub fn remove(&self, asset_id: &str) -> bool {
        self.books.write().remove(asset_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
