//! Series provider trait and structured error types.
//!
//! The SeriesProvider trait abstracts over upstream sources (FRED, Yahoo
//! Finance, synthetic) so the store and download layers never care where a
//! series came from, and tests can swap in canned providers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::circuit_breaker::CircuitBreaker;
use super::fred::FredProvider;
use super::synthetic::SyntheticProvider;
use super::yahoo::YahooProvider;
use crate::domain::{Indicator, Series, SourceKind};
use crate::transform::TransformError;

/// Structured error types for data operations.
///
/// Display strings are for logs; [`DataError::user_message`] gives the
/// classified text shown to dashboard users.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid indicator key '{0}'")]
    InvalidIndicator(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("no stored data for indicator '{indicator}'; run `macrodash fetch {indicator}` first")]
    NoStoredData { indicator: String },

    #[error("invalid series: {0}")]
    Transform(#[from] TransformError),

    #[error("data error: {0}")]
    Other(String),
}

/// Coarse error class for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    RateLimit,
    NotFound,
    Auth,
    Blocked,
    Data,
    Storage,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::RateLimit => "RATE",
            ErrorCategory::NotFound => "404",
            ErrorCategory::Auth => "AUTH",
            ErrorCategory::Blocked => "BLOCK",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Storage => "STORE",
        }
    }
}

impl DataError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DataError::NetworkUnreachable(_) => ErrorCategory::Network,
            DataError::RateLimited { .. } => ErrorCategory::RateLimit,
            DataError::SymbolNotFound { .. } | DataError::InvalidIndicator(_) => {
                ErrorCategory::NotFound
            }
            DataError::AuthenticationRequired(_) => ErrorCategory::Auth,
            DataError::CircuitBreakerTripped => ErrorCategory::Blocked,
            DataError::StoreError(_) | DataError::NoStoredData { .. } => ErrorCategory::Storage,
            DataError::ResponseFormatChanged(_)
            | DataError::Transform(_)
            | DataError::Other(_) => ErrorCategory::Data,
        }
    }

    /// Message suitable for the dashboard's admin panel.
    pub fn user_message(&self) -> String {
        match self {
            DataError::RateLimited { retry_after_secs } => format!(
                "The data provider is rate limiting requests. Try again in about {retry_after_secs} seconds."
            ),
            DataError::SymbolNotFound { symbol } => {
                format!("'{symbol}' is not a valid symbol or series id at the provider.")
            }
            DataError::CircuitBreakerTripped => {
                "The data provider is temporarily blocking requests. Refresh is paused; try again later.".into()
            }
            DataError::AuthenticationRequired(msg) => {
                format!("The provider rejected the request: {msg}")
            }
            DataError::NetworkUnreachable(_) => {
                "Could not reach the data provider. Check the network connection.".into()
            }
            DataError::ResponseFormatChanged(_) => {
                "The provider returned data in an unexpected format.".into()
            }
            other => other.to_string(),
        }
    }
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Fred,
    YahooFinance,
    Store,
    Synthetic,
}

/// Result of a successful fetch for a single source id.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub source_id: String,
    pub series: Series,
    pub origin: DataOrigin,
}

/// Trait for upstream series providers.
///
/// Implementations handle the specifics of one API. The store sits above
/// this trait; providers don't know about it.
pub trait SeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch observations for `source_id` over a date range, ascending.
    fn fetch(
        &self,
        source_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError>;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool;
}

/// Circuit breakers that outlive individual provider instances.
///
/// One per upstream so a blocked quote API does not stall the statistics API.
#[derive(Debug, Clone)]
pub struct ProviderBreakers {
    pub fred: Arc<CircuitBreaker>,
    pub yahoo: Arc<CircuitBreaker>,
}

impl Default for ProviderBreakers {
    fn default() -> Self {
        Self {
            fred: Arc::new(CircuitBreaker::default_provider()),
            yahoo: Arc::new(CircuitBreaker::default_provider()),
        }
    }
}

/// One provider per [`SourceKind`].
pub struct ProviderSet {
    fred: Box<dyn SeriesProvider>,
    yahoo: Box<dyn SeriesProvider>,
}

impl ProviderSet {
    pub fn new(fred: Box<dyn SeriesProvider>, yahoo: Box<dyn SeriesProvider>) -> Self {
        Self { fred, yahoo }
    }

    /// Network-backed providers.
    pub fn live(
        fred_api_key: Option<String>,
        breakers: &ProviderBreakers,
    ) -> Result<Self, DataError> {
        Ok(Self::new(
            Box::new(FredProvider::new(fred_api_key, breakers.fred.clone())?),
            Box::new(YahooProvider::new(breakers.yahoo.clone())?),
        ))
    }

    /// Deterministic random-walk data for offline development.
    pub fn synthetic() -> Self {
        Self::new(
            Box::new(SyntheticProvider::new()),
            Box::new(SyntheticProvider::new()),
        )
    }

    pub fn for_source(&self, source: SourceKind) -> &dyn SeriesProvider {
        match source {
            SourceKind::Fred => self.fred.as_ref(),
            SourceKind::Yahoo => self.yahoo.as_ref(),
        }
    }

    pub fn is_available(&self, source: SourceKind) -> bool {
        self.for_source(source).is_available()
    }

    /// Fetch the series behind `indicator` from its configured provider.
    pub fn fetch_indicator(
        &self,
        indicator: &Indicator,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let provider = self.for_source(indicator.source);
        tracing::info!(
            indicator = %indicator.key,
            provider = provider.name(),
            source_id = %indicator.source_id,
            "fetching series"
        );
        provider.fetch(&indicator.source_id, start, end)
    }
}

/// Progress callback for multi-indicator operations.
pub trait DownloadProgress: Send {
    /// Called when starting to fetch an indicator.
    fn on_start(&self, indicator: &str, index: usize, total: usize);

    /// Called when an indicator fetch completes.
    fn on_complete(
        &self,
        indicator: &str,
        index: usize,
        total: usize,
        result: &Result<(), DataError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, indicator: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {indicator}...", index + 1, total);
    }

    fn on_complete(
        &self,
        indicator: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {indicator}"),
            Err(e) => println!("  FAIL: {indicator}: {}", e.user_message()),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that emits tracing events (used by the server).
pub struct TracingProgress;

impl DownloadProgress for TracingProgress {
    fn on_start(&self, indicator: &str, index: usize, total: usize) {
        tracing::debug!(indicator, index, total, "refresh started");
    }

    fn on_complete(
        &self,
        indicator: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => tracing::info!(indicator, "refresh ok"),
            Err(e) => tracing::warn!(
                indicator,
                category = e.category().label(),
                error = %e,
                "refresh failed"
            ),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "refresh batch complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_classified() {
        assert_eq!(
            DataError::RateLimited {
                retry_after_secs: 60
            }
            .category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            DataError::SymbolNotFound {
                symbol: "NOPE".into()
            }
            .category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            DataError::CircuitBreakerTripped.category(),
            ErrorCategory::Blocked
        );
    }

    #[test]
    fn user_messages_are_distinct_per_class() {
        let rate = DataError::RateLimited {
            retry_after_secs: 30,
        }
        .user_message();
        let missing = DataError::SymbolNotFound {
            symbol: "XYZ".into(),
        }
        .user_message();
        assert!(rate.contains("30 seconds"));
        assert!(missing.contains("'XYZ'"));
        assert_ne!(rate, missing);
    }

    #[test]
    fn synthetic_set_serves_both_sources() {
        let set = ProviderSet::synthetic();
        assert!(set.is_available(SourceKind::Fred));
        assert!(set.is_available(SourceKind::Yahoo));
        assert_eq!(set.for_source(SourceKind::Yahoo).name(), "synthetic");
    }
}
