//! Paper execution client
//!
//! Accepts every order locally, hands out sequential ids and records each
//! call. Used by the binary in place of a signed exchange client and by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{ExecutionClient, ExecutionError, OpenOrder};
use crate::domain::{Cents, Fill};

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum PaperCall {
    Place { order_id: String, token_id: String, price: Cents, size: f64 },
    Cancel { order_ids: Vec<String>, reason: String },
}

#[derive(Debug, Default)]
pub struct PaperExecutionClient {
    next_id: AtomicU64,
    calls: Mutex<Vec<PaperCall>>,
    open_orders: Mutex<HashMap<String, Vec<OpenOrder>>>,
    trades: Mutex<HashMap<String, Vec<Fill>>>,
    fail_cancels: AtomicBool,
    fail_places: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl PaperExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed orders reported by `open_orders`
    pub fn with_open_orders(self, market_id: &str, orders: Vec<OpenOrder>) -> Self {
        self.open_orders.lock().insert(market_id.to_string(), orders);
        self
    }

    /// Seed fills reported by `trade_history`
    pub fn with_trades(self, market_id: &str, fills: Vec<Fill>) -> Self {
        self.trades.lock().insert(market_id.to_string(), fills);
        self
    }

    /// Delay every call
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = Some(latency);
        self
    }

    pub fn set_fail_cancels(&self, fail: bool) {
        self.fail_cancels.store(fail, Ordering::Release);
    }

    pub fn set_fail_places(&self, fail: bool) {
        self.fail_places.store(fail, Ordering::Release);
    }

    pub fn calls(&self) -> Vec<PaperCall> {
        self.calls.lock().clone()
    }

    pub fn placements(&self) -> Vec<PaperCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, PaperCall::Place { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ExecutionClient for PaperExecutionClient {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        price: Cents,
        size: f64,
    ) -> Result<String, ExecutionError> {
        self.simulate_latency().await;
        if self.fail_places.load(Ordering::Acquire) {
            return Err(ExecutionError::Rejected("paper placement disabled".to_string()));
        }

        let order_id = format!("paper-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        info!(
            "[Paper] BUY {:.2} @ {}c token={} -> {}",
            size,
            price,
            &token_id[..8.min(token_id.len())],
            order_id
        );
        self.calls.lock().push(PaperCall::Place {
            order_id: order_id.clone(),
            token_id: token_id.to_string(),
            price,
            size,
        });
        Ok(order_id)
    }

    async fn cancel_orders(&self, order_ids: &[String], reason: &str) -> Result<(), ExecutionError> {
        self.simulate_latency().await;
        if self.fail_cancels.load(Ordering::Acquire) {
            return Err(ExecutionError::Transport("paper cancel disabled".to_string()));
        }

        info!("[Paper] CANCEL {} orders ({})", order_ids.len(), reason);
        self.calls.lock().push(PaperCall::Cancel {
            order_ids: order_ids.to_vec(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn open_orders(&self, market_id: &str) -> Result<Vec<OpenOrder>, ExecutionError> {
        self.simulate_latency().await;
        Ok(self.open_orders.lock().get(market_id).cloned().unwrap_or_default())
    }

    async fn trade_history(&self, market_id: &str) -> Result<Vec<Fill>, ExecutionError> {
        self.simulate_latency().await;
        Ok(self.trades.lock().get(market_id).cloned().unwrap_or_default())
    }
}
