//! Domain Layer
//!
//! Contains pure business entities and domain models.
//! This layer has no dependencies on infrastructure or application layers.

pub mod lots;
pub mod market;
pub mod order;
pub mod orderbook;
pub mod position;
pub mod price;

pub use lots::{hedge_cap, Lot, LotHeap, LotLedger, UnpairedStats, LOT_EPSILON};
pub use market::{parse_timeframe_secs, window_slug, MarketInfo};
pub use order::{truncate_id, Order, OrderTag, Outcome};
pub use orderbook::{BestBidAsk, BookError, BookSide, Level, OrderBook, PriceLevel};
pub use position::{Fill, Position, POSITION_EPSILON};
pub use price::{
    clamp_quotable, parse_price_cents, parse_size, Cents, PriceError, GRID_SIZE,
    MAX_PRICE_CENTS, MIN_PRICE_CENTS, PAYOUT_CENTS,
};
