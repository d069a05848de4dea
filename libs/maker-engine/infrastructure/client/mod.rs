//! External collaborators
//!
//! The engine talks to the exchange only through [`ExecutionClient`] and to
//! the metadata API only through [`MarketMetadataProvider`].

pub mod gamma;
pub mod paper;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Cents, Fill, MarketInfo};

pub use gamma::GammaClient;
pub use paper::{PaperCall, PaperExecutionClient};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error ({status}) for {slug}")]
    ApiError { slug: String, status: u16 },

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    #[error("Invalid market {slug}: {reason}")]
    InvalidMarket { slug: String, reason: String },
}

/// An order resting on the exchange, as reported at startup
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOrder {
    pub id: String,
    pub asset_id: String,
    pub price: Cents,
    pub original_size: f64,
    pub size_matched: f64,
}

/// Order placement and cancellation
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Place a GTC limit buy. Returns the exchange order id.
    async fn place_limit_buy(
        &self,
        token_id: &str,
        price: Cents,
        size: f64,
    ) -> Result<String, ExecutionError>;

    async fn cancel_orders(&self, order_ids: &[String], reason: &str) -> Result<(), ExecutionError>;

    /// Orders still resting in a market
    async fn open_orders(&self, market_id: &str) -> Result<Vec<OpenOrder>, ExecutionError>;

    /// Our past buy fills in a market
    async fn trade_history(&self, market_id: &str) -> Result<Vec<Fill>, ExecutionError>;
}

/// Market window lookup by slug
#[async_trait]
pub trait MarketMetadataProvider: Send + Sync {
    async fn get_market(&self, slug: &str) -> Result<MarketInfo, MetadataError>;
}
