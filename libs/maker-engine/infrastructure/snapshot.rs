//! Top-of-book snapshot recorder
//!
//! Observe mode records both tokens' best bid/ask once per second per market
//! and periodically writes `{dir}/snapshot_<slug>.json`. Diagnostics only:
//! write failures are logged and never reach the trading path.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::BestBidAsk;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopOfBook {
    pub up: BestBidAsk,
    pub down: BestBidAsk,
}

#[derive(Debug, Default)]
struct RecorderState {
    /// slug -> unix second -> top of book
    markets: HashMap<String, BTreeMap<i64, TopOfBook>>,
    dirty: HashSet<String>,
}

#[derive(Debug)]
pub struct SnapshotRecorder {
    dir: PathBuf,
    state: Mutex<RecorderState>,
}

impl SnapshotRecorder {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            state: Mutex::new(RecorderState::default()),
        }
    }

    /// Record a market's top of book. Later ticks in the same second overwrite.
    pub fn tick(&self, slug: &str, unix_secs: i64, up: BestBidAsk, down: BestBidAsk) {
        let mut state = self.state.lock();
        state
            .markets
            .entry(slug.to_string())
            .or_default()
            .insert(unix_secs, TopOfBook { up, down });
        state.dirty.insert(slug.to_string());
    }

    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("snapshot_{}.json", slug))
    }

    /// Recorded seconds for a market
    pub fn len(&self, slug: &str) -> usize {
        self.state.lock().markets.get(slug).map_or(0, BTreeMap::len)
    }

    /// Write every market changed since the last flush. Returns files written.
    pub fn flush(&self) -> io::Result<usize> {
        let pending: Vec<(String, String)> = {
            let mut state = self.state.lock();
            let dirty: Vec<String> = state.dirty.drain().collect();
            let mut out = Vec::with_capacity(dirty.len());
            for slug in dirty {
                if let Some(series) = state.markets.get(&slug) {
                    let json = serde_json::to_string_pretty(series).map_err(io::Error::other)?;
                    out.push((slug, json));
                }
            }
            out
        };

        if pending.is_empty() {
            return Ok(0);
        }

        std::fs::create_dir_all(&self.dir)?;
        let mut written = 0;
        for (slug, json) in pending {
            let path = self.path_for(&slug);
            match std::fs::write(&path, json) {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!("[Snapshot] Failed to write {}: {}", path.display(), e);
                    self.state.lock().dirty.insert(slug);
                }
            }
        }
        debug!("[Snapshot] Flushed {} markets", written);
        Ok(written)
    }

    /// Stop tracking a market (its file stays on disk)
    pub fn forget(&self, slug: &str) {
        let mut state = self.state.lock();
        state.markets.remove(slug);
        state.dirty.remove(slug);
    }
}
