//! Gamma markets API client
//!
//! Resolves a window slug to its market id, token pair and window times.
//! Results are cached per slug in a bounded FIFO.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{MarketMetadataProvider, MetadataError};
use crate::domain::MarketInfo;

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Default)]
struct SlugCache {
    entries: HashMap<String, MarketInfo>,
    order: VecDeque<String>,
}

/// Gamma Markets API client
pub struct GammaClient {
    base_url: String,
    client: Client,
    cache: Mutex<SlugCache>,
    cache_size: usize,
}

impl GammaClient {
    /// Create new Gamma API client
    pub fn new(base_url: impl Into<String>, cache_size: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: Mutex::new(SlugCache::default()),
            cache_size: cache_size.max(1),
        })
    }

    pub fn cached(&self, slug: &str) -> Option<MarketInfo> {
        self.cache.lock().entries.get(slug).cloned()
    }

    fn remember(&self, slug: &str, info: MarketInfo) {
        let mut cache = self.cache.lock();
        if cache.entries.insert(slug.to_string(), info).is_none() {
            cache.order.push_back(slug.to_string());
        }
        while cache.order.len() > self.cache_size {
            if let Some(oldest) = cache.order.pop_front() {
                cache.entries.remove(&oldest);
            }
        }
    }

    async fn fetch(&self, slug: &str) -> Result<MarketInfo> {
        let url = format!("{}/markets/slug/{}", self.base_url, slug);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::ApiError {
                slug: slug.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| MetadataError::DeserializeFailed(e.to_string()))?;

        market_from_payload(slug, &payload)
    }
}

#[async_trait]
impl MarketMetadataProvider for GammaClient {
    async fn get_market(&self, slug: &str) -> Result<MarketInfo> {
        if let Some(info) = self.cached(slug) {
            return Ok(info);
        }
        let info = self.fetch(slug).await?;
        self.remember(slug, info.clone());
        Ok(info)
    }
}

/// Validate a `/markets/slug/{slug}` payload into a [`MarketInfo`].
pub fn market_from_payload(slug: &str, payload: &Value) -> Result<MarketInfo> {
    let invalid = |reason: String| MetadataError::InvalidMarket {
        slug: slug.to_string(),
        reason,
    };

    let tokens = string_list(payload.get("clobTokenIds"));
    if tokens.len() != 2 {
        return Err(invalid(format!("expected 2 tokens, got {:?}", tokens)));
    }

    let end_time = timestamp(payload.get("endDate"))
        .ok_or_else(|| invalid("invalid end date".to_string()))?;
    let start_time = timestamp(payload.get("eventStartTime"))
        .or_else(|| timestamp(payload.get("startDate")))
        .ok_or_else(|| invalid("invalid start date".to_string()))?;

    if !payload.get("active").map(truthy).unwrap_or(false) {
        return Err(invalid("market is not active".to_string()));
    }

    let echoed = payload.get("slug").and_then(Value::as_str).unwrap_or_default();
    if echoed != slug {
        return Err(invalid(format!("slug mismatch, got {}", echoed)));
    }

    let market_id = payload
        .get("conditionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("market id is empty".to_string()))?;

    let (up, down) = order_tokens(&tokens, &string_list(payload.get("outcomes")));

    Ok(MarketInfo::new(market_id, slug, up, down, start_time, end_time))
}

/// Pick (up, down) from the token list using outcome labels when present
fn order_tokens(tokens: &[String], outcomes: &[String]) -> (String, String) {
    let (first, second) = (tokens[0].clone(), tokens[1].clone());
    if outcomes.len() == 2 {
        let first_label = outcomes[0].to_lowercase();
        let second_label = outcomes[1].to_lowercase();
        if first_label == "down" && second_label == "up" {
            return (second, first);
        }
        if first_label != "up" || second_label != "down" {
            warn!("[Gamma] Unexpected outcome labels {:?}, assuming UP first", outcomes);
        }
    }
    (first, second)
}

/// A list given either as a JSON array or as a string containing one
fn string_list(raw: Option<&Value>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let items = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) if !s.is_empty() => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

fn timestamp(raw: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = raw?.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(text).ok()?.with_timezone(&Utc);
    (parsed.timestamp() > 0).then_some(parsed)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "conditionId": "0xabc",
            "slug": "btc-updown-15m-1760000000",
            "active": true,
            "closed": false,
            "endDate": "2025-10-09T09:00:00Z",
            "eventStartTime": "2025-10-09T08:45:00Z",
            "outcomes": "[\"Up\", \"Down\"]",
            "clobTokenIds": "[\"111\", \"222\"]"
        })
    }

    #[test]
    fn test_valid_payload() {
        let info = market_from_payload("btc-updown-15m-1760000000", &payload()).unwrap();
        assert_eq!(info.market_id, "0xabc");
        assert_eq!(info.up_token_id, "111");
        assert_eq!(info.down_token_id, "222");
        assert_eq!((info.end_time - info.start_time).num_seconds(), 900);
    }

    #[test]
    fn test_token_array_and_swapped_labels() {
        let mut p = payload();
        p["clobTokenIds"] = json!(["111", "222"]);
        p["outcomes"] = json!(["Down", "Up"]);
        let info = market_from_payload("btc-updown-15m-1760000000", &p).unwrap();
        assert_eq!(info.up_token_id, "222");
        assert_eq!(info.down_token_id, "111");
    }

    #[test]
    fn test_rejections() {
        let slug = "btc-updown-15m-1760000000";

        let mut p = payload();
        p["clobTokenIds"] = json!("[\"111\"]");
        assert!(market_from_payload(slug, &p).is_err());

        let mut p = payload();
        p["active"] = json!(false);
        assert!(market_from_payload(slug, &p).is_err());

        let mut p = payload();
        p["conditionId"] = json!("");
        assert!(market_from_payload(slug, &p).is_err());

        let mut p = payload();
        p["endDate"] = json!("not a date");
        assert!(market_from_payload(slug, &p).is_err());

        assert!(matches!(
            market_from_payload("eth-updown-15m-1760000000", &payload()),
            Err(MetadataError::InvalidMarket { .. })
        ));
    }

    #[test]
    fn test_cache_is_fifo_bounded() {
        let client = GammaClient::new("http://localhost", 2, Duration::from_secs(1)).unwrap();
        let info = market_from_payload("btc-updown-15m-1760000000", &payload()).unwrap();
        client.remember("a", info.clone());
        client.remember("b", info.clone());
        client.remember("a", info.clone());
        client.remember("c", info);
        assert!(client.cached("a").is_none());
        assert!(client.cached("b").is_some());
        assert!(client.cached("c").is_some());
    }
}
