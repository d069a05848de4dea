//! Engine configuration
//!
//! One YAML file; every field has a default so a partial (or empty) file loads.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::application::strategies::inventory_mm::InventoryMMConfig;
use crate::domain::PAYOUT_CENTS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable replacing the configured symbol list
pub const MARKET_ENV_VAR: &str = "MARKET";

/// What a cycle does once it has a complete book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Decide, reconcile and execute
    #[default]
    Live,
    /// Record top-of-book snapshots only
    Observe,
}

/// Market metadata (Gamma) API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaConfig {
    pub base_url: String,
    pub cache_size: usize,
    pub timeout_secs: u64,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gamma-api.polymarket.com".to_string(),
            cache_size: 256,
            timeout_secs: 10,
        }
    }
}

/// Observe-mode snapshot output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub dir: String,
    pub flush_interval_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: "snapshots".to_string(),
            flush_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub mode: RunMode,

    #[serde(default)]
    pub inventory_mm: InventoryMMConfig,

    #[serde(default)]
    pub gamma: GammaConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mode: RunMode::default(),
            inventory_mm: InventoryMMConfig::default(),
            gamma: GammaConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        if let Ok(markets) = std::env::var(MARKET_ENV_VAR) {
            config.apply_market_override(&markets);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse without environment overrides or validation
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Replace the symbol list from a comma separated value, e.g. `btc,eth`
    pub fn apply_market_override(&mut self, value: &str) {
        let symbols: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return;
        }
        info!("Overriding markets from {}: {}", MARKET_ENV_VAR, symbols.join(","));
        self.inventory_mm = std::mem::take(&mut self.inventory_mm).with_symbols(&symbols);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let mm = &self.inventory_mm;
        let solver = &mm.solver;

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(
                format!("log_level must be one of: {}", valid_levels.join(", ")),
            ));
        }

        if solver.profit_floor_cents < 0 || solver.profit_floor_cents > PAYOUT_CENTS - 2 {
            return Err(ConfigError::ValidationError(format!(
                "profit_floor_cents must be between 0 and {}",
                PAYOUT_CENTS - 2
            )));
        }

        if solver.ladder_sizes.is_empty() {
            return Err(ConfigError::ValidationError(
                "ladder_sizes cannot be empty".to_string(),
            ));
        }

        let sizes = [
            ("min_order_size", solver.min_order_size),
            ("max_close_size", solver.max_close_size),
            ("dust_size", solver.dust_size),
            ("hard_imbalance_threshold", solver.hard_imbalance_threshold),
        ];
        for (name, value) in sizes
            .into_iter()
            .chain(solver.ladder_sizes.iter().map(|s| ("ladder_sizes", *s)))
        {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a non-negative number",
                    name
                )));
            }
        }

        if solver.soft_imbalance_unit <= 0.0 {
            return Err(ConfigError::ValidationError(
                "soft_imbalance_unit must be greater than 0".to_string(),
            ));
        }

        if solver.max_skew_ticks < 0 {
            return Err(ConfigError::ValidationError(
                "max_skew_ticks cannot be negative".to_string(),
            ));
        }

        // A zero delta requotes every maker order on every cycle
        if solver.requote_delta < 1 {
            return Err(ConfigError::ValidationError(
                "requote_delta must be at least 1 cent".to_string(),
            ));
        }

        if mm.workers == 0 {
            return Err(ConfigError::ValidationError(
                "workers must be greater than 0".to_string(),
            ));
        }

        if mm.queue_capacity == 0 || mm.queue_capacity < mm.workers {
            return Err(ConfigError::ValidationError(
                "queue_capacity must be at least the number of workers".to_string(),
            ));
        }

        if mm.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        for spec in &mm.markets {
            if spec.symbol.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "market symbol cannot be empty".to_string(),
                ));
            }
            if spec.interval_secs().is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "unknown timeframe '{}' for {}",
                    spec.timeframe, spec.symbol
                )));
            }
        }

        if self.gamma.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "gamma.base_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        let mm = &self.inventory_mm;
        let solver = &mm.solver;
        info!("Configuration loaded:");
        info!("  Mode: {:?}", self.mode);
        info!("  Log level: {}", self.log_level);
        for spec in &mm.markets {
            info!("  Market: {} {} (look-ahead {})", spec.symbol, spec.timeframe, spec.count);
        }
        info!("  Workers: {} (queue {})", mm.workers, mm.queue_capacity);
        info!("  Warmup: {}s, close-only: {}s", mm.warmup_secs, solver.close_only_secs);
        info!(
            "  Profit floor: {}c, hard imbalance: {}, max close: {}",
            solver.profit_floor_cents, solver.hard_imbalance_threshold, solver.max_close_size
        );
        info!("  Ladder sizes: {:?}", solver.ladder_sizes);
        info!("  Gamma API URL: {}", self.gamma.base_url);
    }
}
