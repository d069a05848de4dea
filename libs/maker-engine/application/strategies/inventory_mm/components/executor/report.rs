//! Result of executing one plan.

use crate::domain::OrderTag;

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Order ids whose cancellation was confirmed
    pub cancelled_ids: Vec<String>,

    /// Placed orders: (tag, exchange order id)
    pub placed: Vec<(OrderTag, String)>,

    /// Tags not placed this cycle because their cancel failed
    pub skipped_tags: Vec<OrderTag>,

    /// Errors encountered: (context, error message)
    pub errors: Vec<(String, String)>,
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled_ids.len()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total operations performed
    pub fn total_operations(&self) -> usize {
        self.cancelled_count() + self.placed_count()
    }

    pub fn add_error(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.errors.push((context.into(), message.into()));
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ExecutionReport) {
        self.cancelled_ids.extend(other.cancelled_ids);
        self.placed.extend(other.placed);
        self.skipped_tags.extend(other.skipped_tags);
        self.errors.extend(other.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;

    #[test]
    fn test_merge() {
        let mut a = ExecutionReport::new();
        a.cancelled_ids.push("x".into());
        let mut b = ExecutionReport::new();
        b.placed.push((OrderTag::ladder(Outcome::Up, 0), "y".into()));
        b.add_error("cancel", "boom");

        a.merge(b);
        assert_eq!(a.total_operations(), 2);
        assert!(a.has_errors());
        assert!(!a.success());
    }
}
