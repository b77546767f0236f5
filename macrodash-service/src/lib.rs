//! MacroDash Service: everything between the core transforms and a front end.
//!
//! This crate builds on `macrodash-core` to provide:
//! - TOML configuration with environment overrides for secrets
//! - Store-or-fetch series loading
//! - The momentum and growth API payloads
//! - Wide CSV export of both views

pub mod app;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod loader;

pub use app::{Dashboard, DashboardError, IndicatorInfo, ProviderHealth};
pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{
    growth_view, momentum_view, ApiResponse, GrowthEntry, MomentumEntry, DEFAULT_GROWTH_MONTHS,
};
pub use export::{growth_csv, momentum_csv, write_csv};
pub use loader::{load_all, load_series, LoadError, LoadOptions, LoadedSeries, LoadedSet};
