//! Flat-file JSON series store.
//!
//! Layout: `{store_dir}/{indicator}.json`, one file per indicator, read and
//! written wholesale.
//!
//! - Atomic writes (write to a per-writer .tmp, rename into place)
//! - Provider fills are serialized through a lock shared by clones
//! - Synthetic records are flagged so live loads can ignore them
//! - Corrupt files are quarantined (`{indicator}.json.quarantined`) and
//!   treated as missing
//! - Status and age queries for maintenance commands

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::provider::DataError;
use crate::domain::{Indicator, Series, SourceKind};
use crate::transform::TransformError;

/// The on-disk record for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSeries {
    pub last_updated: DateTime<Utc>,
    pub indicator: String,
    pub name: String,
    pub source: SourceKind,
    pub source_id: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    /// Generated by the synthetic provider, not fetched upstream.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl StoredSeries {
    pub fn from_series(indicator: &Indicator, series: Series, fetched_at: DateTime<Utc>) -> Self {
        let (dates, values) = series.into_parts();
        Self {
            last_updated: fetched_at.trunc_subsecs(3),
            indicator: indicator.key.clone(),
            name: indicator.name.clone(),
            source: indicator.source,
            source_id: indicator.source_id.clone(),
            dates,
            values,
            synthetic: false,
        }
    }

    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Validated view of the stored observations.
    pub fn series(&self) -> Result<Series, TransformError> {
        Series::new(self.dates.clone(), self.values.clone())
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_updated
    }
}

/// Store status for a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub indicator: String,
    pub cached: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub points: usize,
    pub size_bytes: u64,
    pub synthetic: bool,
}

impl StoreStatus {
    fn missing(indicator: &str) -> Self {
        Self {
            indicator: indicator.to_string(),
            cached: false,
            last_updated: None,
            first_date: None,
            last_date: None,
            points: 0,
            size_bytes: 0,
            synthetic: false,
        }
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The JSON series store.
///
/// Clones share one fill lock; callers that fetch on a miss hold it across
/// the re-check, the provider call and the write.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    dir: PathBuf,
    fill_lock: Arc<Mutex<()>>,
}

impl SeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fill_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Exclusive right to fill the store from a provider.
    pub fn lock_fills(&self) -> MutexGuard<'_, ()> {
        self.fill_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the file for `indicator`. Keys that could escape the store
    /// directory are rejected.
    pub fn path(&self, indicator: &str) -> Result<PathBuf, DataError> {
        if !Indicator::is_valid_key(indicator) {
            return Err(DataError::InvalidIndicator(indicator.to_string()));
        }
        Ok(self.dir.join(format!("{indicator}.json")))
    }

    /// Overwrite the stored record for `record.indicator`.
    pub fn write(&self, record: &StoredSeries) -> Result<(), DataError> {
        let path = self.path(&record.indicator)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::StoreError(format!("failed to create dir: {e}")))?;

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| DataError::StoreError(format!("serialization: {e}")))?;
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp_path, json)
            .map_err(|e| DataError::StoreError(format!("write {}: {e}", tmp_path.display())))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::StoreError(format!("atomic rename failed: {e}"))
        })?;

        tracing::info!(
            indicator = %record.indicator,
            points = record.dates.len(),
            synthetic = record.synthetic,
            "stored series"
        );
        Ok(())
    }

    /// Load the record for `indicator`.
    ///
    /// A file that fails to parse, or whose arrays disagree in length or
    /// order, is moved aside and reported as missing.
    pub fn load(&self, indicator: &str) -> Result<StoredSeries, DataError> {
        let path = self.path(indicator)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(indicator, "store miss");
                return Err(DataError::NoStoredData {
                    indicator: indicator.to_string(),
                });
            }
            Err(e) => {
                return Err(DataError::StoreError(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };

        let validated = serde_json::from_slice::<StoredSeries>(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|record| match record.series() {
                Ok(_) if record.indicator != indicator => Err(format!(
                    "file holds indicator '{}'",
                    record.indicator
                )),
                Ok(_) => Ok(record),
                Err(e) => Err(e.to_string()),
            });

        match validated {
            Ok(record) => Ok(record),
            Err(reason) => {
                self.quarantine(&path, &reason);
                Err(DataError::NoStoredData {
                    indicator: indicator.to_string(),
                })
            }
        }
    }

    fn quarantine(&self, path: &Path, reason: &str) {
        let target = path.with_extension("json.quarantined");
        tracing::warn!(
            path = %path.display(),
            reason,
            "quarantining corrupt store file"
        );
        if let Err(e) = fs::rename(path, &target) {
            tracing::warn!(path = %path.display(), error = %e, "quarantine rename failed");
        }
    }

    pub fn exists(&self, indicator: &str) -> bool {
        self.path(indicator).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Keys of every stored indicator, sorted.
    pub fn list(&self) -> Result<Vec<String>, DataError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::StoreError(format!("read dir: {e}"))),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::StoreError(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Indicator::is_valid_key(stem) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Status of one indicator. Never fails; unreadable entries report as
    /// not cached.
    pub fn entry_status(&self, indicator: &str) -> StoreStatus {
        let size_bytes = self
            .path(indicator)
            .ok()
            .and_then(|p| fs::metadata(p).ok())
            .map_or(0, |m| m.len());

        match self.load(indicator) {
            Ok(record) => StoreStatus {
                indicator: indicator.to_string(),
                cached: true,
                last_updated: Some(record.last_updated),
                first_date: record.dates.first().copied(),
                last_date: record.dates.last().copied(),
                points: record.dates.len(),
                size_bytes,
                synthetic: record.synthetic,
            },
            Err(_) => StoreStatus::missing(indicator),
        }
    }

    pub fn status(&self, indicators: &[&str]) -> Vec<StoreStatus> {
        indicators.iter().map(|k| self.entry_status(k)).collect()
    }

    /// Delete the stored file for `indicator`. Returns whether a file existed.
    pub fn remove(&self, indicator: &str) -> Result<bool, DataError> {
        let path = self.path(indicator)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(indicator, "removed stored series");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DataError::StoreError(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Whether the stored record is younger than `max_age`.
    pub fn is_fresh(&self, indicator: &str, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.load(indicator)
            .map(|r| r.age(now) < max_age)
            .unwrap_or(false)
    }

    /// Stored entries last updated more than `max_age` before `now`.
    pub fn stale_entries(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoreStatus>, DataError> {
        Ok(self
            .list()?
            .iter()
            .map(|k| self.entry_status(k))
            .filter(|s| s.last_updated.map_or(true, |t| now - t > max_age))
            .collect())
    }
}
