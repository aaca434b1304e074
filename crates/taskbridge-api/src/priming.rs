//! Periodic cache priming.
//!
//! The HTTP transport keeps GET responses for a while.  [`CachePrimer`]
//! re-fetches the current user and the workspace list on a fixed interval
//! with `miss_cache` set, so the cache (and the user directory) stays warm
//! without the caller waiting on a cold request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::error::Result;
use crate::options::DEFAULT_PRIME_INTERVAL_SECS;
use crate::transport::RequestOptions;

/// Default priming interval.
pub const DEFAULT_PRIME_INTERVAL: Duration = Duration::from_secs(DEFAULT_PRIME_INTERVAL_SECS);

/// Shortest accepted interval; `tokio::time::interval` rejects zero.
pub const MIN_PRIME_INTERVAL: Duration = Duration::from_millis(10);

/// Run one priming pass: the current user, then the workspace list.
pub async fn prime_once(client: &ApiClient) -> Result<()> {
    client.current_user(RequestOptions::fresh()).await?;
    client.workspaces(RequestOptions::fresh()).await?;
    Ok(())
}

/// Background loop calling [`prime_once`] every `interval`.
pub struct CachePrimer {
    client: Arc<ApiClient>,
    interval: Duration,
    last_primed: Arc<RwLock<Option<DateTime<Utc>>>>,
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl CachePrimer {
    /// Intervals below [`MIN_PRIME_INTERVAL`] are raised to it.
    pub fn new(client: Arc<ApiClient>, interval: Duration) -> Self {
        if interval < MIN_PRIME_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "priming interval too short, clamping"
            );
        }
        Self {
            client,
            interval: interval.max(MIN_PRIME_INTERVAL),
            last_primed: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawn the priming loop.  The first pass runs immediately.
    ///
    /// Must be called from within a tokio runtime.  Calling it while the
    /// loop is already running does nothing.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("start called but cache primer is already running");
            return;
        }

        let client = Arc::clone(&self.client);
        let last_primed = Arc::clone(&self.last_primed);
        let running = Arc::clone(&self.running);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "cache primer started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                match prime_once(&client).await {
                    Ok(()) => {
                        *last_primed.write().await = Some(Utc::now());
                        debug!("cache primed");
                    }
                    Err(e) => warn!(error = %e, "cache priming failed"),
                }
            }
        });

        self.handle = Some(handle);
    }

    /// Stop the loop and wait for the task to wind down.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("stop called but cache primer is not running");
            return;
        }

        if let Some(handle) = self.handle.take() {
            handle.abort();
            if let Err(e) = handle.await
                && !e.is_cancelled()
            {
                error!(error = %e, "cache primer task panicked during shutdown");
            }
        }

        info!("cache primer stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// When the last successful pass finished, if any.
    pub async fn last_primed(&self) -> Option<DateTime<Utc>> {
        *self.last_primed.read().await
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for CachePrimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
