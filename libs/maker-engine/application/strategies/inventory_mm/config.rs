//! Configuration for the Inventory MM strategy

use serde::{Deserialize, Serialize};

use crate::domain::parse_timeframe_secs;

use super::types::SolverConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSpec {
    pub symbol: String,
    pub timeframe: String,
    /// Windows to track ahead of the current one (look-ahead)
    #[serde(default = "default_market_count")]
    pub count: usize,
}

fn default_market_count() -> usize { 1 }

impl MarketSpec {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>, count: usize) -> Self {
        Self { symbol: symbol.into(), timeframe: timeframe.into(), count }
    }

    /// Window length in seconds, `None` for an unknown timeframe label
    pub fn interval_secs(&self) -> Option<i64> {
        parse_timeframe_secs(&self.timeframe)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryMMConfig {
    // === Market Selection ===
    pub markets: Vec<MarketSpec>,

    // === Timing ===
    pub discovery_interval_secs: u64,
    /// A window is not traded until it has been open this long
    pub warmup_secs: i64,
    pub heartbeat_interval_secs: u64,
    pub request_timeout_ms: u64,

    // === Runner ===
    pub workers: usize,
    pub queue_capacity: usize,

    // === Solver ===
    pub solver: SolverConfig,
}

impl Default for InventoryMMConfig {
    fn default() -> Self {
        Self {
            markets: vec![
                MarketSpec::new("btc", "15m", 1),
                MarketSpec::new("eth", "15m", 1),
            ],
            discovery_interval_secs: 30,
            warmup_secs: 10,
            heartbeat_interval_secs: 30,
            request_timeout_ms: 5_000,
            workers: 5,
            queue_capacity: 256,
            solver: SolverConfig::default(),
        }
    }
}

impl InventoryMMConfig {
    pub fn with_markets(mut self, markets: Vec<MarketSpec>) -> Self {
        self.markets = markets;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_warmup_secs(mut self, secs: i64) -> Self {
        self.warmup_secs = secs;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Keep the configured timeframes but trade only these symbols.
    ///
    /// Each symbol gets every distinct timeframe already configured.
    pub fn with_symbols(mut self, symbols: &[String]) -> Self {
        let mut templates: Vec<(String, usize)> = Vec::new();
        for spec in &self.markets {
            if !templates.iter().any(|(tf, _)| tf.eq_ignore_ascii_case(&spec.timeframe)) {
                templates.push((spec.timeframe.clone(), spec.count));
            }
        }
        if templates.is_empty() {
            templates.push(("15m".to_string(), default_market_count()));
        }

        self.markets = symbols
            .iter()
            .flat_map(|symbol| {
                templates
                    .iter()
                    .map(move |(tf, count)| MarketSpec::new(symbol.to_lowercase(), tf.clone(), *count))
            })
            .collect();
        self
    }

    pub fn is_symbol_enabled(&self, symbol: &str) -> bool {
        self.markets.iter().any(|m| m.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InventoryMMConfig::default();
        assert_eq!(config.markets.len(), 2);
        assert_eq!(config.workers, 5);
        assert_eq!(config.warmup_secs, 10);
        assert!(config.queue_capacity >= config.workers);
    }

    #[test]
    fn test_market_spec_interval() {
        let spec = MarketSpec::new("sol", "15m", 2);
        assert_eq!(spec.interval_secs(), Some(900));
        assert_eq!(MarketSpec::new("sol", "soon", 1).interval_secs(), None);
    }

    #[test]
    fn test_with_symbols_keeps_timeframes() {
        let config = InventoryMMConfig::default()
            .with_markets(vec![MarketSpec::new("btc", "15m", 2), MarketSpec::new("btc", "1h", 1)])
            .with_symbols(&["ETH".to_string(), "sol".to_string()]);

        assert_eq!(config.markets.len(), 4);
        assert!(config.is_symbol_enabled("eth"));
        assert!(config.is_symbol_enabled("SOL"));
        assert!(!config.is_symbol_enabled("btc"));
        let eth_hourly = config
            .markets
            .iter()
            .find(|m| m.symbol == "eth" && m.timeframe == "1h")
            .unwrap();
        assert_eq!(eth_hourly.count, 1);
    }
}
