//! Market directory
//!
//! Known market windows, the token -> (market, outcome) index used to route
//! feed events, and the set of markets currently being traded.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::info;

use crate::domain::{MarketInfo, Outcome};

#[derive(Debug, Default)]
struct DirectoryState {
    markets: HashMap<String, MarketInfo>,
    tokens: HashMap<String, (String, Outcome)>,
    active: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MarketDirectory {
    inner: RwLock<DirectoryState>,
}

impl MarketDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or refresh) a market. Returns token ids not seen before.
    pub fn register(&self, info: MarketInfo) -> Vec<String> {
        let mut state = self.inner.write();
        let mut new_tokens = Vec::new();

        for outcome in Outcome::BOTH {
            let token = info.token_id(outcome).to_string();
            if !state.tokens.contains_key(&token) {
                new_tokens.push(token.clone());
            }
            state.tokens.insert(token, (info.market_id.clone(), outcome));
        }

        if !state.markets.contains_key(&info.market_id) {
            info!("[Markets] Registered {}", info.short_desc());
        }
        state.markets.insert(info.market_id.clone(), info);
        new_tokens
    }

    pub fn get(&self, market_id: &str) -> Option<MarketInfo> {
        self.inner.read().markets.get(market_id).cloned()
    }

    /// Market and outcome a token belongs to
    pub fn resolve_token(&self, token_id: &str) -> Option<(String, Outcome)> {
        self.inner.read().tokens.get(token_id).cloned()
    }

    /// Replace the active set
    pub fn set_active<I, S>(&self, market_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let active: HashSet<String> = market_ids.into_iter().map(Into::into).collect();
        self.inner.write().active = active;
    }

    pub fn is_active(&self, market_id: &str) -> bool {
        self.inner.read().active.contains(market_id)
    }

    pub fn active_markets(&self) -> Vec<MarketInfo> {
        let state = self.inner.read();
        let mut markets: Vec<MarketInfo> = state
            .active
            .iter()
            .filter_map(|id| state.markets.get(id).cloned())
            .collect();
        markets.sort_by(|a, b| a.end_time.cmp(&b.end_time));
        markets
    }

    /// Forget expired markets that are no longer active. Returns them.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Vec<MarketInfo> {
        let mut state = self.inner.write();
        let expired: Vec<String> = state
            .markets
            .values()
            .filter(|m| m.is_expired(now) && !state.active.contains(&m.market_id))
            .map(|m| m.market_id.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(info) = state.markets.remove(&id) {
                state.tokens.remove(&info.up_token_id);
                state.tokens.remove(&info.down_token_id);
                removed.push(info);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
