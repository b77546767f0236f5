//! Download orchestrator: fetches indicators one at a time and writes them
//! to the store, with progress reporting.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::provider::{DataError, DataOrigin, DownloadProgress, ProviderSet};
use super::store::{SeriesStore, StoredSeries};
use crate::domain::Indicator;

/// Options for a batch download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Refetch even if the stored copy is fresh.
    pub force: bool,
    /// A stored copy younger than this is left alone unless `force`.
    pub max_age: Duration,
    /// Pause between consecutive provider requests.
    pub request_delay: std::time::Duration,
    /// Let a fresh synthetic record stand in for live data.
    pub synthetic: bool,
}

impl DownloadOptions {
    /// `history_years` of history ending today.
    pub fn trailing_years(today: NaiveDate, history_years: u32) -> Self {
        let start = today
            .checked_sub_months(chrono::Months::new(history_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: today,
            force: false,
            max_age: Duration::hours(12),
            request_delay: std::time::Duration::from_millis(500),
            synthetic: false,
        }
    }
}

/// Fetch every indicator in `indicators` sequentially and store the results.
///
/// Once a provider's circuit breaker is open, remaining indicators on that
/// provider are failed with `CircuitBreakerTripped` without a request.
pub fn download_indicators(
    providers: &ProviderSet,
    store: &SeriesStore,
    indicators: &[Indicator],
    opts: &DownloadOptions,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = indicators.len();
    let mut summary = DownloadSummary {
        total,
        ..DownloadSummary::default()
    };
    let mut fetched_any = false;

    for (i, indicator) in indicators.iter().enumerate() {
        let key = indicator.key.as_str();
        progress.on_start(key, i, total);

        if !opts.force && is_current(store, key, opts) {
            progress.on_complete(key, i, total, &Ok(()));
            summary.skipped.push(key.to_string());
            continue;
        }

        if !providers.is_available(indicator.source) {
            let result = Err(DataError::CircuitBreakerTripped);
            progress.on_complete(key, i, total, &result);
            summary.record(key, result);
            continue;
        }

        if fetched_any && !opts.request_delay.is_zero() {
            std::thread::sleep(opts.request_delay);
        }
        fetched_any = true;

        let result = download_single(providers, store, indicator, opts.start, opts.end, Utc::now());
        progress.on_complete(key, i, total, &result);
        summary.record(key, result);
    }

    progress.on_batch_complete(summary.succeeded(), summary.failed(), total);
    summary
}

/// Whether the stored copy of `key` can be left alone.
fn is_current(store: &SeriesStore, key: &str, opts: &DownloadOptions) -> bool {
    store
        .load(key)
        .map(|r| (opts.synthetic || !r.synthetic) && r.age(Utc::now()) < opts.max_age)
        .unwrap_or(false)
}

/// Fetch one indicator and overwrite its stored copy: fetch → validate → store.
///
/// Runs under the store's fill lock so it cannot interleave with a loader
/// filling the same store.
pub fn download_single(
    providers: &ProviderSet,
    store: &SeriesStore,
    indicator: &Indicator,
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), DataError> {
    if !Indicator::is_valid_key(&indicator.key) {
        return Err(DataError::InvalidIndicator(indicator.key.clone()));
    }
    let _fill = store.lock_fills();
    let fetched = providers.fetch_indicator(indicator, start, end)?;
    if fetched.series.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: indicator.source_id.clone(),
        });
    }
    let synthetic = fetched.origin == DataOrigin::Synthetic;
    let record = StoredSeries::from_series(indicator, fetched.series, now).with_synthetic(synthetic);
    store.write(&record)
}

/// Summary of a batch download operation.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub total: usize,
    /// Indicators fetched and written.
    pub refreshed: Vec<String>,
    /// Indicators left alone because the stored copy was fresh.
    pub skipped: Vec<String>,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    fn record(&mut self, key: &str, result: Result<(), DataError>) {
        match result {
            Ok(()) => self.refreshed.push(key.to_string()),
            Err(e) => self.errors.push((key.to_string(), e)),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.refreshed.len() + self.skipped.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}
