//! Order domain types
//!
//! Outcomes, quoting intents (tags) and live order records.

use super::price::Cents;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two complementary tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Up,
    Down,
}

impl Outcome {
    pub const BOTH: [Outcome; 2] = [Outcome::Up, Outcome::Down];

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Outcome::Up => Outcome::Down,
            Outcome::Down => Outcome::Up,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Up => "UP",
            Outcome::Down => "DOWN",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// OrderTag
// =============================================================================

/// Quoting intent of an order. At most one live order per tag per market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderTag {
    /// Maker ladder rung, `UP_L0`, `DOWN_L2`, ...
    Ladder { outcome: Outcome, level: u8 },
    /// Crossing close/hedge order, `CLOSE_UP` / `CLOSE_DOWN`
    Close(Outcome),
    /// Anything the engine did not place itself (e.g. found at startup)
    Other(String),
}

impl OrderTag {
    pub fn ladder(outcome: Outcome, level: u8) -> Self {
        OrderTag::Ladder { outcome, level }
    }

    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, OrderTag::Close(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            OrderTag::Ladder { outcome, .. } | OrderTag::Close(outcome) => Some(*outcome),
            OrderTag::Other(_) => None,
        }
    }
}

impl fmt::Display for OrderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderTag::Ladder { outcome, level } => write!(f, "{}_L{}", outcome, level),
            OrderTag::Close(outcome) => write!(f, "CLOSE_{}", outcome),
            OrderTag::Other(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for OrderTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_outcome = |o: &str| match o {
            "UP" => Some(Outcome::Up),
            "DOWN" => Some(Outcome::Down),
            _ => None,
        };

        if let Some(rest) = s.strip_prefix("CLOSE_") {
            if let Some(outcome) = parse_outcome(rest) {
                return Ok(OrderTag::Close(outcome));
            }
        }
        if let Some((side, level)) = s.split_once("_L") {
            if let (Some(outcome), Ok(level)) = (parse_outcome(side), level.parse::<u8>()) {
                return Ok(OrderTag::Ladder { outcome, level });
            }
        }
        Ok(OrderTag::Other(s.to_string()))
    }
}

// =============================================================================
// Order
// =============================================================================

/// Live resting order as tracked by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub market_id: String,
    pub asset_id: String,
    pub original_size: f64,
    pub matched_size: f64,
    pub price: Cents,
    pub tag: OrderTag,
}

impl Order {
    /// Unfilled quantity, floored at zero
    #[inline]
    pub fn remaining(&self) -> f64 {
        (self.original_size - self.matched_size).max(0.0)
    }

    pub fn is_filled(&self) -> bool {
        self.remaining() <= 0.0
    }

    /// Short id for log lines
    pub fn short_id(&self) -> &str {
        truncate_id(&self.id, 12)
    }
}

/// First `chars` characters of an id, cut on a char boundary
pub fn truncate_id(id: &str, chars: usize) -> &str {
    let end = id.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(id.len());
    &id[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(original: f64, matched: f64) -> Order {
        Order {
            id: "0xabc".into(),
            market_id: "m".into(),
            asset_id: "a".into(),
            original_size: original,
            matched_size: matched,
            price: 40,
            tag: OrderTag::ladder(Outcome::Up, 0),
        }
    }

    #[test]
    fn test_tag_display_and_parse() {
        for (tag, text) in [
            (OrderTag::ladder(Outcome::Up, 0), "UP_L0"),
            (OrderTag::ladder(Outcome::Down, 3), "DOWN_L3"),
            (OrderTag::Close(Outcome::Up), "CLOSE_UP"),
            (OrderTag::Close(Outcome::Down), "CLOSE_DOWN"),
        ] {
            assert_eq!(tag.to_string(), text);
            assert_eq!(text.parse::<OrderTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(
            "manual".parse::<OrderTag>().unwrap(),
            OrderTag::Other("manual".to_string())
        );
        assert_eq!(
            "SIDE_Lx".parse::<OrderTag>().unwrap(),
            OrderTag::Other("SIDE_Lx".to_string())
        );
    }

    #[test]
    fn test_remaining_is_floored() {
        assert_eq!(order(10.0, 4.0).remaining(), 6.0);
        assert_eq!(order(10.0, 12.0).remaining(), 0.0);
        assert!(order(5.0, 5.0).is_filled());
    }

    #[test]
    fn test_truncate_id_respects_char_boundaries() {
        assert_eq!(truncate_id("0xabcdef0123", 4), "0xab");
        assert_eq!(truncate_id("short", 12), "short");
        assert_eq!(truncate_id("ñññññ", 2), "ññ");
        assert_eq!(truncate_id("", 8), "");
    }

    #[test]
    fn test_outcome_opposite() {
        assert_eq!(Outcome::Up.opposite(), Outcome::Down);
        assert_eq!(Outcome::Down.opposite(), Outcome::Up);
    }
}
