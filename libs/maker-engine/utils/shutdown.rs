//! Process shutdown signal shared by the ingest loop and its timers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, Default)]
struct Shared {
    stopped: AtomicBool,
    notify: Notify,
}

/// Clone-able stop switch. Cloned handles observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownManager {
    shared: Arc<Shared>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the switch on Ctrl+C
    pub fn spawn_signal_handler(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C), draining workers...");
                this.trigger();
            }
        });
    }

    pub fn trigger(&self) {
        if !self.shared.stopped.swap(true, Ordering::AcqRel) {
            self.shared.notify.notify_waiters();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shared.stopped.load(Ordering::Acquire)
    }

    /// Resolves once shutdown has been triggered
    pub async fn wait(&self) {
        loop {
            let notified = self.shared.notify.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration`, waking early on shutdown.
    /// Returns false if shutdown cut the sleep short.
    pub async fn interruptible_sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_running(),
            _ = self.wait() => false,
        }
    }
}
