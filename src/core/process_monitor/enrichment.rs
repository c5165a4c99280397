//! Background enrichment of visible rows with detail metrics.
//!
//! One task at a time runs on a small dedicated Tokio runtime. Results are
//! posted over a channel and applied by the main loop, so the live forest is
//! never touched from another thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::detail::DetailSource;
use super::metrics::MemoryDetail;
use crate::error::{RamtreeError, Result};

/// A process to enrich, identified by pid and start token so that a reused
/// pid is never mistaken for the process that held it before
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichTarget {
    pub pid: u32,
    pub started: String,
}

/// Result of one detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentUpdate {
    pub pid: u32,
    pub started: String,
    pub detail: MemoryDetail,
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Minimum time between the starts of two tasks
    pub cooldown: Duration,
    /// Maximum number of pids per task
    pub batch_size: usize,
    /// Delay between consecutive fetches inside one task
    pub pacing: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(10),
            batch_size: 5,
            pacing: Duration::from_millis(500),
        }
    }
}

pub struct EnrichmentScheduler {
    runtime: Option<tokio::runtime::Runtime>,
    source: Arc<dyn DetailSource>,
    config: EnrichmentConfig,
    update_tx: mpsc::UnboundedSender<EnrichmentUpdate>,
    update_rx: mpsc::UnboundedReceiver<EnrichmentUpdate>,
    in_flight: Option<JoinHandle<()>>,
    last_started: Option<Instant>,
}

impl EnrichmentScheduler {
    pub fn new(source: Arc<dyn DetailSource>, config: EnrichmentConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("enrich-worker")
            .build()
            .map_err(|e| {
                RamtreeError::runtime(format!("Failed to start enrichment worker: {}", e))
            })?;

        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime: Some(runtime),
            source,
            config,
            update_tx,
            update_rx,
            in_flight: None,
            last_started: None,
        })
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Whether a task is still working through its pids
    pub fn is_running(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn last_started(&self) -> Option<Instant> {
        self.last_started
    }

    /// No task in flight and the cooldown since the last start has passed
    pub fn is_ready(&self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        match self.last_started {
            Some(started) => now.saturating_duration_since(started) >= self.config.cooldown,
            None => true,
        }
    }

    /// Start a task over the first `batch_size` targets if allowed.
    /// Returns whether a task was started.
    pub fn try_schedule(&mut self, now: Instant, mut targets: Vec<EnrichTarget>) -> bool {
        if targets.is_empty() || !self.is_ready(now) {
            return false;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return false;
        };

        targets.truncate(self.config.batch_size);
        log::debug!(
            "starting enrichment for pids {:?}",
            targets.iter().map(|t| t.pid).collect::<Vec<_>>()
        );

        let handle = runtime.spawn(enrich_task(
            targets,
            Arc::clone(&self.source),
            self.update_tx.clone(),
            self.config.pacing,
        ));

        self.in_flight = Some(handle);
        self.last_started = Some(now);
        true
    }

    /// Take every update posted since the last drain
    pub fn drain(&mut self) -> Vec<EnrichmentUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.update_rx.try_recv() {
            updates.push(update);
        }
        updates
    }
}

impl Drop for EnrichmentScheduler {
    fn drop(&mut self) {
        // Don't block exit on a fetch that is still running
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Fetch detail metrics for each target in order, pacing consecutive fetches.
/// Runs to completion; stops early only if the receiving side is gone.
async fn enrich_task(
    targets: Vec<EnrichTarget>,
    source: Arc<dyn DetailSource>,
    update_tx: mpsc::UnboundedSender<EnrichmentUpdate>,
    pacing: Duration,
) {
    let count = targets.len();

    for (i, target) in targets.into_iter().enumerate() {
        let fetch_source = Arc::clone(&source);
        let pid = target.pid;
        let detail = tokio::task::spawn_blocking(move || fetch_source.collect_for(pid))
            .await
            .unwrap_or_default();

        let update = EnrichmentUpdate {
            pid,
            started: target.started,
            detail,
        };
        if update_tx.send(update).is_err() {
            log::debug!("enrichment receiver dropped, stopping early");
            break;
        }

        if i + 1 < count && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }

    log::trace!("enrichment task finished");
}
