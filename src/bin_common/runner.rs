//! Binary runner utilities
//!
//! Loop timings and startup/shutdown banners.

use std::time::Duration;

use tracing::info;

use maker_engine::EngineConfig;

/// Timings for the engine's main loop
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    pub heartbeat_interval_secs: u64,
    pub discovery_interval: Duration,
    /// Snapshot flush period; `None` outside observe mode
    pub snapshot_flush: Option<Duration>,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heartbeat_interval_secs: 30,
            discovery_interval: Duration::from_secs(30),
            snapshot_flush: None,
        }
    }

    pub fn from_engine(name: impl Into<String>, config: &EngineConfig) -> Self {
        let mm = &config.inventory_mm;
        let mut run = Self::new(name)
            .with_heartbeat(mm.heartbeat_interval_secs)
            .with_discovery_interval(Duration::from_secs(mm.discovery_interval_secs.max(1)));
        if config.mode == maker_engine::RunMode::Observe {
            run.snapshot_flush = Some(Duration::from_secs(config.snapshot.flush_interval_secs.max(1)));
        }
        run
    }

    pub fn with_heartbeat(mut self, secs: u64) -> Self {
        self.heartbeat_interval_secs = secs;
        self
    }

    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval = interval;
        self
    }
}

pub fn print_banner(name: &str) {
    info!("");
    info!("========================================");
    info!("Starting {}", name);
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

pub fn print_shutdown(name: &str, stats: Option<&str>) {
    info!("");
    info!("========================================");
    info!("{} stopped gracefully", name);
    if let Some(stats) = stats {
        info!("{}", stats);
    }
    info!("========================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use maker_engine::RunMode;

    #[test]
    fn test_run_config_from_engine() {
        let mut config = EngineConfig::default();
        let run = RunConfig::from_engine("maker", &config);
        assert_eq!(run.name, "maker");
        assert_eq!(run.heartbeat_interval_secs, config.inventory_mm.heartbeat_interval_secs);
        assert!(run.snapshot_flush.is_none());

        config.mode = RunMode::Observe;
        config.snapshot.flush_interval_secs = 0;
        let run = RunConfig::from_engine("maker", &config);
        assert_eq!(run.snapshot_flush, Some(Duration::from_secs(1)));
    }
}
