//! Full-reload orchestration and source file change detection
//!
//! The loader owns the reload state machine (`Idle -> Reloading -> Idle`)
//! and the last-known modification time of the source file. A reload
//! clears the store, streams the file line by line, parses and
//! aggregates the records, and writes each city's result back into the
//! store. At most one reload runs at a time; a concurrent request is a
//! no-op that is dropped, not queued.
//!
//! Malformed lines are skipped with a logged diagnostic rather than
//! aborting the pass; an I/O failure mid-read stops the pass early and
//! leaves whatever was already written in place.
//!
//! Because the store is cleared before repopulation, a concurrent reader
//! may observe a city as transiently absent during a reload. This
//! staleness window is an accepted, documented trade-off.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::aggregator;
use crate::error::Result;
use crate::parser::RecordParser;
use crate::store::TemperatureStore;
use crate::types::{CityAggregates, Record};

/// Outcome of a reload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The reload ran to completion (possibly against a missing file,
    /// in which case the store stays empty)
    Completed {
        /// Number of distinct cities written into the store
        cities: usize,
        /// Number of malformed lines skipped during the pass
        skipped_lines: usize,
    },
    /// Another reload was already in flight; this request was dropped
    Skipped,
    /// An I/O error aborted the read pass. The store holds whatever was
    /// written before the failure; the error itself is only logged.
    Failed,
}

/// Outcome of a periodic change check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCheck {
    /// The file's modification time was strictly newer than the
    /// recorded one; a reload was triggered
    ReloadTriggered,
    /// Nothing to do
    Unchanged,
    /// The file disappeared since it was last recorded as present. The
    /// recorded timestamp is reset to 0; cached data is retained as
    /// last-known-good.
    FileRemoved,
}

/// Mutable loader state, held only while the reload guard is locked.
#[derive(Debug, Default)]
struct LoaderState {
    /// Modification time of the source file at the end of the last
    /// reload, in epoch milliseconds. 0 means "no file".
    last_modified_ms: i64,
}

/// Aggregation result of one read pass over the source file.
struct PassSummary {
    aggregates: HashMap<String, CityAggregates>,
    skipped_lines: usize,
}

/// Orchestrates full reloads of the store from the source file.
///
/// Holds the only mutable loader state in the system; the state mutex
/// doubles as the mutual-exclusion guard for reloads, so `is_idle`
/// reports whether a reload is in flight.
pub struct CsvLoader {
    store: Arc<TemperatureStore>,
    parser: RecordParser,
    source_path: PathBuf,
    state: Mutex<LoaderState>,
}

impl CsvLoader {
    /// Create a loader for the given store and source file path
    pub fn new(store: Arc<TemperatureStore>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            parser: RecordParser::new(),
            source_path: source_path.into(),
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// Create a loader with a custom record parser
    pub fn with_parser(
        store: Arc<TemperatureStore>,
        source_path: impl Into<PathBuf>,
        parser: RecordParser,
    ) -> Self {
        Self {
            store,
            parser,
            source_path: source_path.into(),
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// Path of the watched source file
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Whether no reload is currently in flight
    pub fn is_idle(&self) -> bool {
        !self.state.is_locked()
    }

    /// Run a full reload: clear the store, re-read the source file, and
    /// repopulate city by city.
    ///
    /// At most one reload runs system-wide; if another is in flight this
    /// request returns [`ReloadOutcome::Skipped`] without waiting.
    pub fn reload(&self) -> ReloadOutcome {
        let Some(mut state) = self.state.try_lock() else {
            tracing::debug!("Reload already in flight, dropping request");
            return ReloadOutcome::Skipped;
        };
        self.reload_locked(&mut state)
    }

    /// Compare the source file's existence and modification time against
    /// the last recorded value, triggering a reload when it is strictly
    /// newer.
    ///
    /// A check racing an in-flight reload is a no-op.
    pub fn check_changed(&self) -> ChangeCheck {
        let Some(mut state) = self.state.try_lock() else {
            return ChangeCheck::Unchanged;
        };

        match Self::modified_ms(&self.source_path) {
            Some(modified) if modified > state.last_modified_ms => {
                info!(path = %self.source_path.display(), "Source file was modified");
                self.reload_locked(&mut state);
                ChangeCheck::ReloadTriggered
            },
            Some(_) => ChangeCheck::Unchanged,
            None => {
                if state.last_modified_ms > 0 {
                    info!(path = %self.source_path.display(), "Source file was deleted");
                    // Cached data stays in place as last-known-good.
                    state.last_modified_ms = 0;
                    ChangeCheck::FileRemoved
                } else {
                    ChangeCheck::Unchanged
                }
            },
        }
    }

    /// Reload body, entered with the state guard held.
    fn reload_locked(&self, state: &mut LoaderState) -> ReloadOutcome {
        self.store.clear();

        let mut cities = 0;
        let mut skipped_lines = 0;
        let mut failed = false;

        if self.source_path.exists() {
            info!(path = %self.source_path.display(), "Reload started");

            match self.read_and_aggregate() {
                Ok(summary) => {
                    skipped_lines = summary.skipped_lines;
                    cities = summary.aggregates.len();
                    for (city, aggregates) in summary.aggregates {
                        self.store.put(city, aggregates);
                    }
                    info!(cities, skipped_lines, "Reload finished");
                },
                Err(e) => {
                    // Freshness is affected, not availability: whatever
                    // was already written stays, and the error never
                    // reaches foreground callers.
                    error!(path = %self.source_path.display(), error = %e, "Error reading source file");
                    failed = true;
                },
            }
        } else {
            warn!(path = %self.source_path.display(), "Source file does not exist, store left empty");
        }

        state.last_modified_ms = Self::modified_ms(&self.source_path).unwrap_or(0);

        if failed {
            ReloadOutcome::Failed
        } else {
            ReloadOutcome::Completed {
                cities,
                skipped_lines,
            }
        }
    }

    /// Stream the source file, parse each line, and aggregate.
    ///
    /// Malformed lines are skipped and counted; an I/O error while
    /// reading aborts the pass.
    fn read_and_aggregate(&self) -> Result<PassSummary> {
        let file = File::open(&self.source_path)?;
        let reader = BufReader::new(file);

        let mut records: Vec<Record> = Vec::new();
        let mut skipped_lines = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            match self.parser.parse_line(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped_lines += 1;
                    warn!(line = index + 1, error = %e, "Skipping malformed line");
                },
            }
        }

        Ok(PassSummary {
            aggregates: aggregator::aggregate(records),
            skipped_lines,
        })
    }

    /// Modification time of a file in epoch milliseconds, `None` when
    /// the file does not exist or its metadata is unreadable.
    fn modified_ms(path: &Path) -> Option<i64> {
        let modified: SystemTime = std::fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified).timestamp_millis())
    }
}
