//! Grouping and averaging of parsed records
//!
//! Groups a stream of [`Record`]s by city, then within each city by
//! year, and reduces each (city, year) group to one [`YearlyAverage`]:
//! the arithmetic mean of all temperatures in the group, rounded to
//! 2 decimal places half-up, exactly once at the end.
//!
//! Per-city list order is the first-seen order of distinct years in the
//! input stream. That order is observable to callers, so the grouping
//! here is order-preserving: each city accumulates its years in a
//! vector rather than a sorted or hashed map.

use std::collections::HashMap;

use crate::types::{CityAggregates, Record, YearlyAverage};

/// Running sum and count for one (city, year) group.
#[derive(Debug)]
struct YearBucket {
    year: String,
    sum: f64,
    count: u64,
}

impl YearBucket {
    fn new(year: String, temperature: f64) -> Self {
        Self {
            year,
            sum: temperature,
            count: 1,
        }
    }

    fn add(&mut self, temperature: f64) {
        self.sum += temperature;
        self.count += 1;
    }

    /// A bucket exists only because at least one record produced it,
    /// so the count is never zero here.
    fn finish(self) -> YearlyAverage {
        YearlyAverage::new(self.year, round_half_up(self.sum / self.count as f64))
    }
}

/// Round to 2 decimal places, half-up (ties away from zero).
fn round_half_up(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group records by city and year and reduce each group to its rounded
/// yearly average.
///
/// Averages are accumulated as raw sums and rounded once per group at
/// the end, never as already-rounded intermediate values.
pub fn aggregate(records: impl IntoIterator<Item = Record>) -> HashMap<String, CityAggregates> {
    let mut buckets: HashMap<String, Vec<YearBucket>> = HashMap::new();

    for record in records {
        let years = buckets.entry(record.city).or_default();
        // Linear scan keeps first-seen year order; the number of
        // distinct years per city stays small.
        match years.iter_mut().find(|bucket| bucket.year == record.year) {
            Some(bucket) => bucket.add(record.temperature),
            None => years.push(YearBucket::new(record.year, record.temperature)),
        }
    }

    buckets
        .into_iter()
        .map(|(city, years)| {
            let aggregates = years.into_iter().map(YearBucket::finish).collect();
            (city, aggregates)
        })
        .collect()
}
