//! City lookup surface
//!
//! The request-handling layer turns a city name into a lookup call here
//! and renders the response. Only [`LookupError::InvalidCity`] and
//! [`LookupError::CityNotFound`] are part of the caller-visible
//! contract; reload failures never propagate through this path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::store::TemperatureStore;
use crate::types::CityAggregates;

/// A city's annual average temperatures as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTemperatures {
    /// The city that was looked up
    pub city: String,
    /// Yearly averages in first-seen year order
    pub data: CityAggregates,
}

/// Read-side service answering per-city lookups against the store.
#[derive(Clone)]
pub struct TemperatureService {
    store: Arc<TemperatureStore>,
}

impl TemperatureService {
    /// Create a service over the given store
    pub fn new(store: Arc<TemperatureStore>) -> Self {
        Self { store }
    }

    /// Look up the annual average temperatures for a city.
    ///
    /// An empty or whitespace-only city identifier is rejected with
    /// [`LookupError::InvalidCity`] before the store is consulted; a
    /// city absent from the cache yields [`LookupError::CityNotFound`].
    pub fn annual_averages(&self, city: &str) -> Result<CityTemperatures, LookupError> {
        if city.trim().is_empty() {
            return Err(LookupError::InvalidCity);
        }

        match self.store.get(city) {
            Some(data) => Ok(CityTemperatures {
                city: city.to_string(),
                data,
            }),
            None => Err(LookupError::CityNotFound(city.to_string())),
        }
    }

    /// Snapshot of currently cached cities, for diagnostics.
    pub fn cached_cities(&self) -> Vec<String> {
        self.store.keys()
    }
}
