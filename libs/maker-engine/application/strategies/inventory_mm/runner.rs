//! Strategy runner - fixed worker pool with per-market single-flight.
//!
//! Ingestion only enqueues market ids. A market already pending is not queued
//! again; its flag clears once the worker has finished that market's cycle, so
//! every cycle reads current state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::cycle::{CycleOutcome, MarketCycle};

enum WorkItem {
    Market(String),
    Shutdown,
}

/// Result of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    /// Already pending; the pending cycle will see the new state
    AlreadyPending,
    QueueFull,
    Closed,
}

#[derive(Debug, Default)]
pub struct RunnerStats {
    pub cycles: AtomicU64,
    pub skipped: AtomicU64,
    pub dropped: AtomicU64,
    pub errors: AtomicU64,
}

impl RunnerStats {
    pub fn summary(&self) -> String {
        format!(
            "cycles={} skipped={} dropped={} errors={}",
            self.cycles.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
            self.dropped.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

/// Clone-able handle for enqueueing work. No shutdown capability.
#[derive(Clone)]
pub struct RunnerHandle {
    tx: Sender<WorkItem>,
    pending: Arc<Mutex<HashSet<String>>>,
    stats: Arc<RunnerStats>,
}

impl RunnerHandle {
    pub fn enqueue(&self, market_id: &str) -> Enqueue {
        {
            let mut pending = self.pending.lock();
            if !pending.insert(market_id.to_string()) {
                return Enqueue::AlreadyPending;
            }
        }

        match self.tx.try_send(WorkItem::Market(market_id.to_string())) {
            Ok(()) => Enqueue::Queued,
            Err(TrySendError::Full(_)) => {
                self.pending.lock().remove(market_id);
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("[Runner] Queue full, dropped market={}", market_id);
                Enqueue::QueueFull
            }
            Err(TrySendError::Disconnected(_)) => {
                self.pending.lock().remove(market_id);
                Enqueue::Closed
            }
        }
    }

    pub fn is_pending(&self, market_id: &str) -> bool {
        self.pending.lock().contains(market_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// No market queued or in flight
    pub fn is_idle(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }
}

/// Clears a market's pending flag when its cycle ends, even on panic
struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<String>>,
    market_id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(self.market_id);
    }
}

pub struct StrategyRunner {
    handle: RunnerHandle,
    workers: Vec<JoinHandle<()>>,
}

impl StrategyRunner {
    /// Spawn `workers` threads sharing a bounded queue of `queue_capacity`.
    pub fn spawn(cycle: Arc<dyn MarketCycle>, workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = bounded(queue_capacity.max(1));
        let handle = RunnerHandle {
            tx,
            pending: Arc::new(Mutex::new(HashSet::new())),
            stats: Arc::new(RunnerStats::default()),
        };

        let mut threads = Vec::with_capacity(workers);
        for index in 0..workers.max(1) {
            let rx = rx.clone();
            let cycle = Arc::clone(&cycle);
            let pending = Arc::clone(&handle.pending);
            let stats = Arc::clone(&handle.stats);

            match thread::Builder::new()
                .name(format!("maker-worker-{}", index))
                .spawn(move || worker_loop(index, rx, cycle, pending, stats))
            {
                Ok(t) => threads.push(t),
                Err(e) => error!("[Runner] Failed to spawn worker {}: {}", index, e),
            }
        }

        info!("[Runner] Started {} workers (queue {})", threads.len(), queue_capacity);
        Self {
            handle,
            workers: threads,
        }
    }

    pub fn handle(&self) -> RunnerHandle {
        self.handle.clone()
    }

    pub fn enqueue(&self, market_id: &str) -> Enqueue {
        self.handle.enqueue(market_id)
    }

    pub fn is_idle(&self) -> bool {
        self.handle.is_idle()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers after the cycles already queued, then join them
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        for _ in 0..self.workers.len() {
            // Blocks while the queue is full; workers keep draining it.
            if self.handle.tx.send(WorkItem::Shutdown).is_err() {
                break;
            }
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("[Runner] Worker panicked");
            }
        }
        info!("[Runner] Stopped ({})", self.handle.stats.summary());
    }
}

impl Drop for StrategyRunner {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop();
        }
    }
}

fn worker_loop(
    index: usize,
    rx: Receiver<WorkItem>,
    cycle: Arc<dyn MarketCycle>,
    pending: Arc<Mutex<HashSet<String>>>,
    stats: Arc<RunnerStats>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("[Runner] Worker {} could not build runtime: {}", index, e);
            return;
        }
    };
    debug!("[Runner] Worker {} started", index);

    while let Ok(item) = rx.recv() {
        let market_id = match item {
            WorkItem::Market(id) => id,
            WorkItem::Shutdown => break,
        };

        let _guard = PendingGuard {
            pending: &pending,
            market_id: &market_id,
        };

        match cycle.run_cycle(&runtime, &market_id) {
            CycleOutcome::Skipped(_) => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
            CycleOutcome::Observed => {
                stats.cycles.fetch_add(1, Ordering::Relaxed);
            }
            CycleOutcome::Executed { report, .. } => {
                stats.cycles.fetch_add(1, Ordering::Relaxed);
                if report.has_errors() {
                    stats.errors.fetch_add(report.errors.len() as u64, Ordering::Relaxed);
                }
            }
        }
    }

    debug!("[Runner] Worker {} exiting", index);
}
