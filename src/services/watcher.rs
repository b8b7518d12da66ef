//! Source file watcher service
//!
//! Polls the loader's change check on a fixed period. Polling was kept
//! over OS-level file notification for simplicity and portability; the
//! interval and the idle-only guard are explicit configuration.
//!
//! The idle-only guard prevents the periodic trigger from overlapping a
//! reload it started itself; a manual reload racing the periodic one is
//! handled by the loader's own mutual-exclusion guard.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::debug;

use crate::loader::{ChangeCheck, CsvLoader};

use super::{Service, ServiceError, ServiceStatus};

/// Configuration for the file watcher service
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Period between change checks
    pub poll_interval: Duration,
    /// Whether the watcher runs at all
    pub enabled: bool,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            enabled: true,
        }
    }
}

/// Counters collected by the watcher, for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct WatcherStats {
    /// Change checks performed
    pub checks: u64,
    /// Checks that triggered a reload
    pub reloads_triggered: u64,
    /// Checks that observed the source file's removal
    pub removals_observed: u64,
}

/// Background service polling the source file for changes.
pub struct FileWatcherService {
    config: FileWatcherConfig,
    loader: Arc<CsvLoader>,
    status: RwLock<ServiceStatus>,
    stats: RwLock<WatcherStats>,
}

impl FileWatcherService {
    /// Create a new watcher over the given loader
    pub fn new(config: FileWatcherConfig, loader: Arc<CsvLoader>) -> Self {
        Self {
            config,
            loader,
            status: RwLock::new(ServiceStatus::Stopped),
            stats: RwLock::new(WatcherStats::default()),
        }
    }

    /// Create with default configuration
    pub fn with_loader(loader: Arc<CsvLoader>) -> Self {
        Self::new(FileWatcherConfig::default(), loader)
    }

    /// Current watcher counters
    pub fn stats(&self) -> WatcherStats {
        self.stats.read().clone()
    }

    /// Run one change check, honoring the idle-only guard.
    fn run_check(&self) {
        if !self.loader.is_idle() {
            debug!("Loader mid-reload, skipping change check");
            return;
        }

        let outcome = self.loader.check_changed();

        let mut stats = self.stats.write();
        stats.checks += 1;
        match outcome {
            ChangeCheck::ReloadTriggered => stats.reloads_triggered += 1,
            ChangeCheck::FileRemoved => stats.removals_observed += 1,
            ChangeCheck::Unchanged => {},
        }
    }
}

#[async_trait::async_trait]
impl Service for FileWatcherService {
    async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServiceError> {
        if !self.config.enabled {
            debug!("File watcher disabled by configuration");
            *self.status.write() = ServiceStatus::Stopped;
            return Ok(());
        }

        *self.status.write() = ServiceStatus::Running;
        debug!(
            path = %self.loader.source_path().display(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "File watcher started"
        );

        let mut poll = interval(self.config.poll_interval);
        // The first tick fires immediately; skip it so startup wiring
        // controls the initial load.
        poll.tick().await;

        loop {
            tokio::select! {
                result = shutdown.recv() => {
                    match result {
                        Ok(()) | Err(broadcast::error::RecvError::Closed) => {
                            debug!("File watcher received shutdown signal");
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            debug!(missed = n, "File watcher broadcast receiver lagged");
                        }
                    }
                }

                _ = poll.tick() => {
                    self.run_check();
                }
            }
        }

        *self.status.write() = ServiceStatus::Stopped;
        debug!("File watcher stopped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file_watcher"
    }

    fn status(&self) -> ServiceStatus {
        self.status.read().clone()
    }
}
