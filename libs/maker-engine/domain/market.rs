//! Market metadata and window naming

use super::order::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Information about one UP/DOWN market window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Unique market (condition) identifier
    pub market_id: String,
    /// Human readable slug, e.g. `btc-updown-15m-1760000000`
    pub slug: String,
    /// Token ID for UP outcome
    pub up_token_id: String,
    /// Token ID for DOWN outcome
    pub down_token_id: String,
    /// Window start
    pub start_time: DateTime<Utc>,
    /// Window end (resolution)
    pub end_time: DateTime<Utc>,
}

impl MarketInfo {
    pub fn new(
        market_id: impl Into<String>,
        slug: impl Into<String>,
        up_token_id: impl Into<String>,
        down_token_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            slug: slug.into(),
            up_token_id: up_token_id.into(),
            down_token_id: down_token_id.into(),
            start_time,
            end_time,
        }
    }

    /// Seconds until resolution (negative once expired)
    pub fn time_left_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.end_time - now).num_seconds()
    }

    /// Seconds since the window opened (negative before it opens)
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Up => &self.up_token_id,
            Outcome::Down => &self.down_token_id,
        }
    }

    /// Which outcome a token id belongs to, if any
    pub fn outcome_of(&self, token_id: &str) -> Option<Outcome> {
        if token_id == self.up_token_id {
            Some(Outcome::Up)
        } else if token_id == self.down_token_id {
            Some(Outcome::Down)
        } else {
            None
        }
    }

    /// Get a short description for logging.
    pub fn short_desc(&self) -> String {
        format!(
            "{} ({})",
            self.slug,
            &self.market_id[..8.min(self.market_id.len())]
        )
    }
}

// =============================================================================
// Window naming
// =============================================================================

/// Parse a timeframe label (`5m`, `15m`, `1h`, `1hr`, `4h`, `1d`) into seconds.
pub fn parse_timeframe_secs(timeframe: &str) -> Option<i64> {
    let tf = timeframe.trim().to_lowercase();
    let split = tf.find(|c: char| !c.is_ascii_digit())?;
    let (num, unit) = tf.split_at(split);
    let n: i64 = num.parse().ok().filter(|n| *n > 0)?;

    let unit_secs = match unit {
        "m" | "min" => 60,
        "h" | "hr" => 3600,
        "d" => 86_400,
        _ => return None,
    };
    Some(n * unit_secs)
}

/// Slug of the `index`-th window from now: `{symbol}-updown-{timeframe}-{start}`
/// where `start = now - now % interval + interval * index`.
pub fn window_slug(symbol: &str, timeframe: &str, interval_secs: i64, now_ts: i64, index: u32) -> String {
    let start = now_ts - now_ts.rem_euclid(interval_secs) + interval_secs * index as i64;
    format!("{}-updown-{}-{}", symbol.to_lowercase(), timeframe, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn market(start: DateTime<Utc>, end: DateTime<Utc>) -> MarketInfo {
        MarketInfo::new("0xmarket-1", "btc-updown-15m-0", "up-1", "down-1", start, end)
    }

    #[test]
    fn test_time_left_and_elapsed() {
        let now = Utc::now();
        let m = market(now - Duration::seconds(30), now + Duration::seconds(870));
        assert_eq!(m.time_left_secs(now), 870);
        assert_eq!(m.elapsed_secs(now), 30);
        assert!(!m.is_expired(now));
        assert!(m.is_expired(now + Duration::seconds(870)));
    }

    #[test]
    fn test_outcome_of() {
        let now = Utc::now();
        let m = market(now, now);
        assert_eq!(m.outcome_of("up-1"), Some(Outcome::Up));
        assert_eq!(m.outcome_of("down-1"), Some(Outcome::Down));
        assert_eq!(m.outcome_of("other"), None);
        assert_eq!(m.token_id(Outcome::Down), "down-1");
    }

    #[test]
    fn test_parse_timeframe() {
        assert_eq!(parse_timeframe_secs("15m"), Some(900));
        assert_eq!(parse_timeframe_secs("1h"), Some(3600));
        assert_eq!(parse_timeframe_secs("1hr"), Some(3600));
        assert_eq!(parse_timeframe_secs("4h"), Some(14_400));
        assert_eq!(parse_timeframe_secs("1d"), Some(86_400));
        assert_eq!(parse_timeframe_secs("15"), None);
        assert_eq!(parse_timeframe_secs("m"), None);
        assert_eq!(parse_timeframe_secs("0m"), None);
        assert_eq!(parse_timeframe_secs("3w"), None);
    }

    #[test]
    fn test_window_slug() {
        assert_eq!(window_slug("BTC", "15m", 900, 1_000, 0), "btc-updown-15m-900");
        assert_eq!(window_slug("eth", "15m", 900, 1_000, 1), "eth-updown-15m-1800");
        assert_eq!(window_slug("sol", "15m", 900, 900, 0), "sol-updown-15m-900");
    }

    #[test]
    fn test_short_desc() {
        let now = Utc::now();
        assert_eq!(market(now, now).short_desc(), "btc-updown-15m-0 (0xmarket)");
    }
}
