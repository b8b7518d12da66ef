//! Core data types used throughout the cache pipeline
//!
//! # Key Types
//!
//! - **`Record`**: one parsed city/year/temperature observation
//! - **`YearlyAverage`**: the rounded mean temperature for one city in one year
//! - **`CityAggregates`**: the ordered per-city list of yearly averages
//!
//! # Example
//!
//! ```rust
//! use citytemp::types::{Record, YearlyAverage};
//!
//! let record = Record::new("Gdansk", "2019", 10.0);
//! assert_eq!(record.year, "2019");
//!
//! let avg = YearlyAverage::new("2019", 15.0);
//! assert_eq!(avg.average_temperature, 15.0);
//! ```

use serde::{Deserialize, Serialize};

/// A single parsed observation from the source file.
///
/// Records are transient: they exist only while one reload pass runs and
/// are never stored. The year is kept as the raw leading date segment
/// (4 characters in practice) rather than a numeric type, since it is
/// only ever compared and echoed back, never computed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// City name exactly as it appears in the source file
    /// (case- and whitespace-sensitive)
    pub city: String,
    /// Year component of the record's date field
    pub year: String,
    /// Measured temperature
    pub temperature: f64,
}

impl Record {
    /// Create a new record
    pub fn new(city: impl Into<String>, year: impl Into<String>, temperature: f64) -> Self {
        Self {
            city: city.into(),
            year: year.into(),
            temperature,
        }
    }
}

/// The arithmetic mean temperature for one city in one year, rounded to
/// 2 decimal places using half-up rounding. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAverage {
    /// Year the average covers
    pub year: String,
    /// Mean of all temperatures recorded for the city/year in the most
    /// recent load, rounded exactly once at the end
    pub average_temperature: f64,
}

impl YearlyAverage {
    /// Create a new yearly average
    pub fn new(year: impl Into<String>, average_temperature: f64) -> Self {
        Self {
            year: year.into(),
            average_temperature,
        }
    }
}

/// Ordered sequence of yearly averages for one city.
///
/// The order is the order in which distinct years were first encountered
/// while scanning the source file, not sorted by year or value. Callers
/// can observe this order, so it is preserved deliberately.
pub type CityAggregates = Vec<YearlyAverage>;
