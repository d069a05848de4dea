use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use maker_engine::{
    init_tracing, EngineConfig, GammaClient, Heartbeat, InventoryMMStrategy, MarketStore,
    PaperExecutionClient, RunMode, ShutdownManager,
};
use updown_maker::bin_common::{
    load_config_from_env, parse_args, print_banner, print_shutdown, ConfigType, RunConfig,
};

const NAME: &str = "Up/Down Maker";

/// Reads feed messages as NDJSON on stdin and trades against the paper client.
#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1)).map_err(|e| anyhow!(e))?;
    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(|| load_config_from_env(ConfigType::Maker));

    let mut config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if args.observe {
        config.mode = RunMode::Observe;
    }

    init_tracing(&config.log_level);
    config.log();

    let run = RunConfig::from_engine(NAME, &config);
    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let metadata = Arc::new(GammaClient::new(
        config.gamma.base_url.clone(),
        config.gamma.cache_size,
        Duration::from_secs(config.gamma.timeout_secs),
    )?);
    let client = Arc::new(PaperExecutionClient::new());
    let strategy = InventoryMMStrategy::new(&config, MarketStore::shared(), metadata, client);

    print_banner(&run.name);

    let discovery = strategy.discover(Utc::now()).await;
    log_subscriptions(&discovery.new_tokens);
    strategy.hydrate().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut feed_open = true;
    let (mut ingested, mut rejected) = (0u64, 0u64);

    let mut discovery_tick = interval_at(Instant::now() + run.discovery_interval, run.discovery_interval);
    discovery_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut housekeeping = interval(Duration::from_secs(1));
    let flush_period = run.snapshot_flush.unwrap_or(Duration::from_secs(3600));
    let mut flush_tick = interval_at(Instant::now() + flush_period, flush_period);
    let mut heartbeat = Heartbeat::new(run.heartbeat_interval_secs);

    while shutdown.is_running() {
        tokio::select! {
            line = lines.next_line(), if feed_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match strategy.ingest(&line) {
                    Ok(_) => ingested += 1,
                    Err(e) => {
                        rejected += 1;
                        warn!("[Feed] Dropped message: {}", e);
                    }
                },
                Ok(None) => {
                    info!("[Feed] Input closed, still running until Ctrl+C");
                    feed_open = false;
                }
                Err(e) => {
                    warn!("[Feed] Read error: {}", e);
                    feed_open = false;
                }
            },
            _ = discovery_tick.tick() => {
                let report = strategy.discover(Utc::now()).await;
                log_subscriptions(&report.new_tokens);
            }
            _ = housekeeping.tick() => {
                // Time alone can move a market into close-only
                if heartbeat.tick(Utc::now()) {
                    strategy.log_status();
                    strategy.enqueue_active();
                }
            }
            _ = flush_tick.tick(), if run.snapshot_flush.is_some() => strategy.flush_snapshots(),
            _ = shutdown.wait() => break,
        }
    }

    let stats = format!("Feed messages: {} ingested, {} rejected", ingested, rejected);
    tokio::task::spawn_blocking(move || strategy.shutdown())
        .await
        .context("joining workers")?;
    print_shutdown(&run.name, Some(&stats));

    Ok(())
}

fn log_subscriptions(tokens: &[String]) {
    if !tokens.is_empty() {
        info!("[Feed] Subscribe to {} new tokens: {}", tokens.len(), tokens.join(", "));
    }
}
