//! Order types produced by the decision engine

use crate::domain::{Cents, OrderTag, Outcome};

/// An order the engine wants resting (not yet an exchange order)
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredOrder {
    pub outcome: Outcome,
    pub token_id: String,
    pub price: Cents,
    pub size: f64,
    pub tag: OrderTag,
}

impl DesiredOrder {
    pub fn ladder(outcome: Outcome, token_id: impl Into<String>, price: Cents, size: f64, level: u8) -> Self {
        Self {
            outcome,
            token_id: token_id.into(),
            price,
            size,
            tag: OrderTag::ladder(outcome, level),
        }
    }

    pub fn close(outcome: Outcome, token_id: impl Into<String>, price: Cents, size: f64) -> Self {
        Self {
            outcome,
            token_id: token_id.into(),
            price,
            size,
            tag: OrderTag::Close(outcome),
        }
    }
}

impl std::fmt::Display for DesiredOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2} @ {}c", self.tag, self.size, self.price)
    }
}
