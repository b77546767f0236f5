//! MacroDash Core: series model, transforms, providers and storage.
//!
//! This crate contains the analytical heart of the dashboard:
//! - Domain types (series, periods, the indicator registry)
//! - Momentum rebasing with on-or-before / nearest baseline resolution
//! - Multi-series date-intersection alignment
//! - Monthly aggregation and month-over-month growth
//! - FRED and Yahoo Finance adapters behind a shared circuit breaker
//! - Flat-file JSON series store

pub mod data;
pub mod domain;
pub mod transform;
