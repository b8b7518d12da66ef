//! Concurrent city -> aggregates cache
//!
//! The store is the leaf of the pipeline: a sharded concurrent map from
//! city identifier to its ordered list of yearly averages. Reads are
//! lock-free with respect to the whole map and are never blocked by a
//! reload for longer than one entry swap.
//!
//! A city key is present only if at least one record for that city was
//! seen in the most recent successful load. A city's full list is always
//! written atomically relative to other cities, though the store as a
//! whole may be observed transiently empty while a reload repopulates it.

use dashmap::DashMap;

use crate::types::CityAggregates;

/// Thread-safe in-memory cache of per-city yearly temperature averages.
///
/// Explicitly constructed and shared via `Arc`; there is no process-wide
/// singleton. Contents are replaced wholesale on every successful reload
/// and cleared entirely on shutdown.
#[derive(Debug, Default)]
pub struct TemperatureStore {
    cache: DashMap<String, CityAggregates>,
}

impl TemperatureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Non-blocking read of one city's aggregates.
    ///
    /// Returns a clone of the cached list, or `None` if the city is not
    /// present. Safe to call from any number of concurrent callers during
    /// a concurrent reload; the caller may then observe a city as
    /// transiently absent (see module docs).
    pub fn get(&self, city: &str) -> Option<CityAggregates> {
        self.cache.get(city).map(|entry| entry.value().clone())
    }

    /// Upsert one city's full aggregate list, replacing any prior value.
    pub fn put(&self, city: impl Into<String>, aggregates: CityAggregates) {
        self.cache.insert(city.into(), aggregates);
    }

    /// Remove one city's aggregates, returning them if present.
    pub fn remove(&self, city: &str) -> Option<CityAggregates> {
        self.cache.remove(city).map(|(_, aggregates)| aggregates)
    }

    /// Remove all entries. Used at the start of every reload and at
    /// process shutdown.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Snapshot of currently cached city identifiers.
    ///
    /// Used for diagnostics; not relied upon for correctness elsewhere.
    pub fn keys(&self) -> Vec<String> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of cached cities
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
