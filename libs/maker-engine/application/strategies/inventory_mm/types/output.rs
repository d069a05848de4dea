//! Output types from the solver
//!
//! `Plan` is the reconciliation result handed to the executor.

use std::collections::BTreeMap;

use super::order::DesiredOrder;
use crate::domain::OrderTag;

/// Cancels grouped by tag, then placements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Order ids to cancel, per tag
    pub cancel_by_tag: BTreeMap<OrderTag, Vec<String>>,

    /// Orders to place
    pub place: Vec<DesiredOrder>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any actions to execute
    pub fn has_actions(&self) -> bool {
        self.cancel_count() > 0 || !self.place.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_actions()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_by_tag.values().map(Vec::len).sum()
    }

    /// Total number of actions
    pub fn action_count(&self) -> usize {
        self.cancel_count() + self.place.len()
    }

    pub fn add_cancel(&mut self, tag: &OrderTag, order_id: impl Into<String>) {
        self.cancel_by_tag
            .entry(tag.clone())
            .or_default()
            .push(order_id.into());
    }

    /// Flattened cancel ids in tag order
    pub fn cancel_ids(&self) -> Vec<String> {
        self.cancel_by_tag.values().flatten().cloned().collect()
    }
}
