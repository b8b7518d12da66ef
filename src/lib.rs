//! Citytemp - In-memory city temperature aggregation cache
//!
//! This library ingests a delimited file of per-measurement records
//! (city, date, temperature), computes the average temperature per city
//! per year, and serves point lookups by city from a concurrent
//! in-memory store. The computed result set is kept in sync with the
//! source file, which may be edited or deleted at any time, without a
//! process restart.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod error;
pub mod parser;
pub mod store;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Full-reload orchestration and source file change detection
pub mod loader;

/// City lookup surface exposed to request handlers
pub mod query;

/// Background services: lifecycle framework and the source file watcher
pub mod services;

// Re-export main types
pub use error::{Error, LookupError, RecordParseError, Result};
pub use loader::{ChangeCheck, CsvLoader, ReloadOutcome};
pub use query::{CityTemperatures, TemperatureService};
pub use store::TemperatureStore;
pub use types::{CityAggregates, Record, YearlyAverage};
