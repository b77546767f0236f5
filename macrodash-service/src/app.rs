//! The dashboard as one value: config, store and provider breakers.
//!
//! Both front ends (CLI and HTTP server) hold a `Dashboard` and call into it;
//! nothing here is global. All methods block, so the server runs them on
//! its blocking pool.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use macrodash_core::data::{
    download_indicators, BreakerStatus, DataError, DownloadOptions, DownloadProgress,
    DownloadSummary, ProviderBreakers, ProviderSet, SeriesStore, StoredSeries,
};
use macrodash_core::domain::{Indicator, Period, SourceKind};

use crate::config::{ConfigError, DashboardConfig};
use crate::dashboard::{growth_view, momentum_view, ApiResponse, GrowthEntry, MomentumEntry};
use crate::loader::{load_all, LoadOptions, LoadedSet};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Registry entry joined with its store status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorInfo {
    pub key: String,
    pub name: String,
    pub source: SourceKind,
    pub source_id: String,
    pub category: String,
    pub cached: bool,
    pub last_updated: Option<chrono::DateTime<Utc>>,
    pub points: usize,
    /// The stored copy came from the synthetic provider.
    pub synthetic: bool,
}

/// Circuit-breaker state per upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub fred: BreakerStatus,
    pub yahoo: BreakerStatus,
}

pub struct Dashboard {
    config: DashboardConfig,
    store: SeriesStore,
    breakers: ProviderBreakers,
    synthetic: bool,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let store = SeriesStore::new(config.store.dir.clone());
        Self {
            config,
            store,
            breakers: ProviderBreakers::default(),
            synthetic: false,
        }
    }

    /// Serve deterministic synthetic series instead of calling providers.
    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Provider set for one batch of requests. Breakers outlive it.
    pub fn providers(&self) -> Result<ProviderSet, DataError> {
        if self.synthetic {
            return Ok(ProviderSet::synthetic());
        }
        ProviderSet::live(self.config.fred.api_key.clone(), &self.breakers)
    }

    fn history_start(&self, today: NaiveDate) -> NaiveDate {
        DownloadOptions::trailing_years(today, self.config.fetch.history_years).start
    }

    fn load(&self, today: NaiveDate) -> LoadedSet {
        let opts = LoadOptions {
            start: self.history_start(today),
            end: today,
            offline: self.config.fetch.offline,
            request_delay: self.config.fetch.request_delay(),
            synthetic: self.synthetic,
        };
        let providers = if opts.offline {
            None
        } else {
            match self.providers() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "providers unavailable; serving stored data only");
                    None
                }
            }
        };
        load_all(&self.config.indicators, &self.store, providers.as_ref(), &opts)
    }

    /// The momentum view for `period` as of `today`.
    pub fn momentum(&self, period: Period, today: NaiveDate) -> ApiResponse<MomentumEntry> {
        let loaded = self.load(today);
        momentum_view(&loaded.records(), period, today)
    }

    /// The growth view, each indicator cut to its trailing `months`.
    pub fn growth(&self, months: usize, today: NaiveDate) -> ApiResponse<GrowthEntry> {
        let loaded = self.load(today);
        growth_view(&loaded.records(), months)
    }

    /// Refetch `keys` (all registered indicators when empty) sequentially.
    pub fn refresh(
        &self,
        keys: &[String],
        force: bool,
        today: NaiveDate,
        progress: &dyn DownloadProgress,
    ) -> Result<DownloadSummary, DashboardError> {
        let indicators = self.config.select(keys)?;
        let providers = self.providers()?;
        let opts = DownloadOptions {
            force,
            request_delay: self.config.fetch.request_delay(),
            synthetic: self.synthetic,
            ..DownloadOptions::trailing_years(today, self.config.fetch.history_years)
        };
        Ok(download_indicators(
            &providers,
            &self.store,
            &indicators,
            &opts,
            progress,
        ))
    }

    /// The raw stored series for `key`.
    pub fn stored(&self, key: &str) -> Result<StoredSeries, DataError> {
        self.store.load(key)
    }

    pub fn indicators(&self) -> Vec<IndicatorInfo> {
        self.config.indicators.iter().map(|i| self.info(i)).collect()
    }

    fn info(&self, indicator: &Indicator) -> IndicatorInfo {
        let status = self.store.entry_status(&indicator.key);
        IndicatorInfo {
            key: indicator.key.clone(),
            name: indicator.name.clone(),
            source: indicator.source,
            source_id: indicator.source_id.clone(),
            category: indicator.category.clone(),
            cached: status.cached,
            last_updated: status.last_updated,
            points: status.points,
            synthetic: status.synthetic,
        }
    }

    pub fn provider_health(&self) -> ProviderHealth {
        ProviderHealth {
            fred: self.breakers.fred.status(),
            yahoo: self.breakers.yahoo.status(),
        }
    }

    /// Check `candidate` against the configured admin password. BLAKE3
    /// digest equality is constant time. Always false when no password is
    /// configured.
    pub fn verify_admin(&self, candidate: &str) -> bool {
        let Some(expected) = self.config.admin.password.as_deref() else {
            return false;
        };
        let a = blake3::hash(candidate.as_bytes());
        let b = blake3::hash(expected.as_bytes());
        a == b
    }
}
