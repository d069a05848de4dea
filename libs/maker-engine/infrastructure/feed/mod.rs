//! Feed message codec
//!
//! Turns raw JSON from the market and user channels into [`FeedEvent`]s.
//! A payload may be a single object or an array; each record is decoded on
//! its own and malformed ones are dropped without affecting the rest.

pub mod types;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::{parse_price_cents, parse_size, BookSide, Cents, Fill, PriceLevel};

pub use types::{BookMessage, OrderMessage, PriceChangeEntry, PriceChangeMessage, TradeMessage};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected payload shape")]
    Shape,
}

/// Order lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    Placement,
    Update,
    Cancellation,
}

impl OrderEventKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind.to_uppercase().as_str() {
            "PLACEMENT" => Some(OrderEventKind::Placement),
            "UPDATE" => Some(OrderEventKind::Update),
            "CANCELLATION" => Some(OrderEventKind::Cancellation),
            _ => None,
        }
    }
}

/// Decoded order event
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub id: String,
    pub kind: OrderEventKind,
    pub asset_id: Option<String>,
    pub market_id: Option<String>,
    pub price: Option<Cents>,
    pub original_size: Option<f64>,
    pub size_matched: Option<f64>,
}

/// Event applied to the market store
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    BookSnapshot {
        asset_id: String,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    },
    LevelUpdate {
        asset_id: String,
        side: BookSide,
        price: Cents,
        size: f64,
    },
    Fill(Fill),
    Order(OrderEvent),
}

/// Decode one payload into events.
///
/// Only a payload that is not JSON at all is an error.
pub fn parse_message(raw: &str) -> Result<Vec<FeedEvent>, FeedError> {
    let value: Value = serde_json::from_str(raw)?;
    let records = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(FeedError::Shape),
    };

    let mut events = Vec::new();
    for record in records {
        decode_record(record, &mut events);
    }
    Ok(events)
}

fn decode_record(record: Value, out: &mut Vec<FeedEvent>) {
    let event_type = record
        .get("event_type")
        .and_then(Value::as_str)
        .map(str::to_lowercase);

    match event_type.as_deref() {
        Some("book") => match serde_json::from_value::<BookMessage>(record) {
            Ok(msg) => out.push(FeedEvent::BookSnapshot {
                asset_id: msg.asset_id,
                bids: msg.bids,
                asks: msg.asks,
            }),
            Err(e) => debug!("[Feed] Dropping book message: {}", e),
        },
        Some("price_change") => match serde_json::from_value::<PriceChangeMessage>(record) {
            Ok(msg) => {
                for entry in msg.price_changes {
                    if let Some(event) = decode_price_change(entry) {
                        out.push(event);
                    }
                }
            }
            Err(e) => debug!("[Feed] Dropping price_change message: {}", e),
        },
        Some("trade") => match serde_json::from_value::<TradeMessage>(record) {
            Ok(msg) => {
                if let Some(fill) = decode_trade(msg) {
                    out.push(FeedEvent::Fill(fill));
                }
            }
            Err(e) => debug!("[Feed] Dropping trade message: {}", e),
        },
        Some("order") => match serde_json::from_value::<OrderMessage>(record) {
            Ok(msg) => {
                if let Some(event) = decode_order(msg) {
                    out.push(FeedEvent::Order(event));
                }
            }
            Err(e) => debug!("[Feed] Dropping order message: {}", e),
        },
        other => debug!("[Feed] Ignoring event type {:?}", other),
    }
}

fn decode_price_change(entry: Value) -> Option<FeedEvent> {
    let entry: PriceChangeEntry = serde_json::from_value(entry)
        .map_err(|e| debug!("[Feed] Dropping price change entry: {}", e))
        .ok()?;

    let side = BookSide::from_wire(&entry.side)?;
    let price = parse_price_cents(&entry.price)
        .map_err(|e| debug!("[Feed] Dropping price change for {}: {}", entry.asset_id, e))
        .ok()?;
    let size = parse_size(&entry.size)
        .map_err(|e| debug!("[Feed] Dropping price change for {}: {}", entry.asset_id, e))
        .ok()?;

    Some(FeedEvent::LevelUpdate {
        asset_id: entry.asset_id,
        side,
        price,
        size,
    })
}

fn decode_trade(msg: TradeMessage) -> Option<Fill> {
    if !msg.side.eq_ignore_ascii_case("BUY") {
        return None;
    }
    if msg
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("FAILED"))
    {
        return None;
    }

    let price = parse_price_cents(&msg.price)
        .map_err(|e| debug!("[Feed] Dropping trade {:?}: {}", msg.id, e))
        .ok()?;
    let size = parse_size(&msg.size)
        .map_err(|e| debug!("[Feed] Dropping trade {:?}: {}", msg.id, e))
        .ok()?;

    Some(Fill {
        trade_id: msg.id,
        asset_id: msg.asset_id,
        market_id: msg.market.unwrap_or_default(),
        price,
        size,
    })
}

fn decode_order(msg: OrderMessage) -> Option<OrderEvent> {
    let kind = OrderEventKind::from_wire(&msg.kind)?;
    Some(OrderEvent {
        id: msg.id,
        kind,
        asset_id: msg.asset_id,
        market_id: msg.market,
        price: msg.price.as_deref().and_then(|p| parse_price_cents(p).ok()),
        original_size: msg.original_size.as_deref().and_then(|s| parse_size(s).ok()),
        size_matched: msg.size_matched.as_deref().and_then(|s| parse_size(s).ok()),
    })
}
