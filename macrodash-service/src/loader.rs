//! Series loading for the dashboard views.
//!
//! Given a list of indicators, loads each stored series. Fallback policy:
//! 1. If the store has the indicator → use it
//! 2. If not stored, not offline and the provider is available → fetch and
//!    write it back
//! 3. Otherwise → report the indicator as failed; the caller omits it
//!
//! A record written by the synthetic provider only counts as stored when
//! the caller accepts synthetic data. Fetch-on-miss runs under the store's
//! fill lock and re-checks the store first, so concurrent loaders of a cold
//! store make one upstream request per indicator.
//!
//! Indicators are fetched one at a time with a pause between requests.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use macrodash_core::data::{DataError, DataOrigin, ProviderSet, SeriesStore, StoredSeries};
use macrodash_core::domain::Indicator;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no stored data for '{indicator}' and running offline")]
    NoStoredDataOffline { indicator: String },

    #[error("no stored data for '{indicator}' and fetch failed: {source}")]
    FetchFailed {
        indicator: String,
        #[source]
        source: DataError,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl LoadError {
    /// Classified message for dashboard users.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::FetchFailed { source, .. } | LoadError::Data(source) => {
                source.user_message()
            }
            other => other.to_string(),
        }
    }
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// If true, never make network requests.
    pub offline: bool,
    /// Pause between consecutive provider requests.
    pub request_delay: std::time::Duration,
    /// Accept records generated by the synthetic provider.
    pub synthetic: bool,
}

/// One loaded indicator with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub record: StoredSeries,
    pub origin: DataOrigin,
}

/// Everything `load_all` could produce, plus what it could not.
#[derive(Debug, Default)]
pub struct LoadedSet {
    pub series: BTreeMap<String, LoadedSeries>,
    pub failures: Vec<(String, LoadError)>,
}

impl LoadedSet {
    /// Stored records in indicator-key order.
    pub fn records(&self) -> Vec<&StoredSeries> {
        self.series.values().map(|s| &s.record).collect()
    }
}

/// The stored record for `indicator`, if it is usable under `opts`.
fn stored_record(
    indicator: &Indicator,
    store: &SeriesStore,
    opts: &LoadOptions,
) -> Result<Option<StoredSeries>, LoadError> {
    match store.load(&indicator.key) {
        Ok(record) if record.synthetic && !opts.synthetic => {
            tracing::debug!(indicator = %indicator.key, "ignoring synthetic record");
            Ok(None)
        }
        Ok(record) => Ok(Some(record)),
        Err(DataError::NoStoredData { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load one indicator from the store, fetching it on a miss.
pub fn load_series(
    indicator: &Indicator,
    store: &SeriesStore,
    providers: Option<&ProviderSet>,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    let from_store = |record| LoadedSeries {
        record,
        origin: DataOrigin::Store,
    };

    if let Some(record) = stored_record(indicator, store, opts)? {
        return Ok(from_store(record));
    }

    let providers = match providers {
        Some(p) if !opts.offline => p,
        _ => {
            return Err(LoadError::NoStoredDataOffline {
                indicator: indicator.key.clone(),
            })
        }
    };

    let fetch_failed = |source: DataError| LoadError::FetchFailed {
        indicator: indicator.key.clone(),
        source,
    };

    let _fill = store.lock_fills();
    if let Some(record) = stored_record(indicator, store, opts)? {
        tracing::debug!(indicator = %indicator.key, "filled by another loader");
        return Ok(from_store(record));
    }

    if !providers.is_available(indicator.source) {
        return Err(fetch_failed(DataError::CircuitBreakerTripped));
    }

    let fetched = providers
        .fetch_indicator(indicator, opts.start, opts.end)
        .map_err(fetch_failed)?;
    let origin = fetched.origin;
    let record = StoredSeries::from_series(indicator, fetched.series, Utc::now())
        .with_synthetic(origin == DataOrigin::Synthetic);
    store.write(&record)?;

    Ok(LoadedSeries { record, origin })
}

/// Load every indicator sequentially. Failures are collected, not fatal.
pub fn load_all(
    indicators: &[Indicator],
    store: &SeriesStore,
    providers: Option<&ProviderSet>,
    opts: &LoadOptions,
) -> LoadedSet {
    let mut set = LoadedSet::default();
    let mut fetched_any = false;

    for indicator in indicators {
        // Only provider round-trips are rate limited.
        let will_fetch = !opts.offline
            && providers.is_some()
            && matches!(stored_record(indicator, store, opts), Ok(None));
        if will_fetch && fetched_any && !opts.request_delay.is_zero() {
            std::thread::sleep(opts.request_delay);
        }
        fetched_any |= will_fetch;

        match load_series(indicator, store, providers, opts) {
            Ok(loaded) => {
                set.series.insert(indicator.key.clone(), loaded);
            }
            Err(e) => {
                tracing::warn!(indicator = %indicator.key, error = %e, "indicator unavailable");
                set.failures.push((indicator.key.clone(), e));
            }
        }
    }

    set
}
