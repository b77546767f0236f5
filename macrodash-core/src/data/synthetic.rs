//! Deterministic synthetic series for offline development and demos.
//!
//! Same source id, same range, same numbers. Values are a business-day
//! random walk starting at 100, seeded from the source id.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataOrigin, FetchResult, SeriesProvider};
use crate::domain::Series;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Generate the walk for `source_id` over `[start, end]`, weekends skipped.
pub fn generate_walk(source_id: &str, start: NaiveDate, end: NaiveDate) -> Series {
    let seed: [u8; 32] = *blake3::hash(source_id.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut observations = Vec::new();
    let mut value = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }
        observations.push((current, value));
        let step: f64 = rng.gen_range(-0.015..0.015);
        value *= 1.0 + step;
        current += Duration::days(1);
    }

    Series::from_observations(observations)
}

impl SeriesProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        source_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let series = generate_walk(source_id, start, end);
        if series.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: source_id.to_string(),
            });
        }
        tracing::warn!(source_id, points = series.len(), "serving synthetic data");
        Ok(FetchResult {
            source_id: source_id.to_string(),
            series,
            origin: DataOrigin::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
