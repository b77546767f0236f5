//! Series acquisition and storage: provider adapters, the JSON store and
//! sequential download orchestration.

pub mod circuit_breaker;
pub mod download;
pub mod fred;
pub mod http;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, BreakerStatus, CircuitBreaker};
pub use download::{download_indicators, download_single, DownloadOptions, DownloadSummary};
pub use fred::FredProvider;
pub use provider::{
    DataError, DataOrigin, DownloadProgress, ErrorCategory, FetchResult, ProviderBreakers,
    ProviderSet, SeriesProvider, StdoutProgress, TracingProgress,
};
pub use store::{SeriesStore, StoreStatus, StoredSeries};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
