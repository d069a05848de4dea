//! Wire types for market and user feed messages.
//!
//! Prices and sizes arrive as decimal strings. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::domain::PriceLevel;

/// Full book snapshot (`event_type: "book"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default, alias = "buys")]
    pub bids: Vec<PriceLevel>,
    #[serde(default, alias = "sells")]
    pub asks: Vec<PriceLevel>,
}

/// Batch of absolute level updates (`event_type: "price_change"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeMessage {
    #[serde(default)]
    pub market: Option<String>,
    /// Kept raw so one bad entry does not reject the batch
    #[serde(default)]
    pub price_changes: Vec<serde_json::Value>,
}

/// Single level update inside a `price_change` batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeEntry {
    pub asset_id: String,
    pub price: String,
    pub size: String,
    pub side: String,
}

/// One of our trades (`event_type: "trade"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub market: Option<String>,
    pub price: String,
    pub size: String,
    pub side: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Lifecycle event for one of our orders (`event_type: "order"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMessage {
    pub id: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub original_size: Option<String>,
    #[serde(default)]
    pub size_matched: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_message_aliases() {
        let msg: BookMessage = serde_json::from_str(
            r#"{"asset_id":"a","buys":[{"price":"0.40","size":"5"}],"sells":[],"timestamp":"1"}"#,
        )
        .unwrap();
        assert_eq!(msg.bids.len(), 1);
        assert!(msg.asks.is_empty());
        assert!(msg.market.is_none());
    }

    #[test]
    fn test_order_message_type_field() {
        let msg: OrderMessage =
            serde_json::from_str(r#"{"id":"o1","type":"CANCELLATION"}"#).unwrap();
        assert_eq!(msg.kind, "CANCELLATION");
        assert!(msg.size_matched.is_none());
    }
}
