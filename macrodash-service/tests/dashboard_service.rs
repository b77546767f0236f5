//! Dashboard facade tests against a temp store and synthetic providers.

use chrono::NaiveDate;
use std::path::Path;

use macrodash_core::data::{DataError, DownloadProgress, StoredSeries};
use macrodash_core::domain::{Indicator, Period, Series, SourceKind};
use macrodash_service::{Dashboard, DashboardConfig, DashboardError};

struct Quiet;

impl DownloadProgress for Quiet {
    fn on_start(&self, _: &str, _: usize, _: usize) {}
    fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<(), DataError>) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

fn config(store_dir: &Path, offline: bool) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.store.dir = store_dir.to_path_buf();
    config.fetch.offline = offline;
    config.fetch.history_years = 2;
    config.fetch.request_delay_ms = 0;
    config.indicators = vec![
        Indicator::new("sp500", "S&P 500", SourceKind::Yahoo, "^GSPC", "equities"),
        Indicator::new("cpi", "Consumer Price Index", SourceKind::Fred, "CPIAUCSL", "macro"),
    ];
    config
}

#[test]
fn synthetic_momentum_covers_every_indicator() {
    let dir = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(dir.path(), false)).with_synthetic(true);

    let view = dashboard.momentum(Period::OneYear, today());
    assert!(view.success);
    assert_eq!(view.count, 2);
    assert_eq!(view.data["sp500"].dates, view.data["cpi"].dates);
    assert_eq!(view.data["cpi"].values[0], 100.0);
    assert_eq!(view.data["cpi"].name, "Consumer Price Index");

    // Fetched series were written back.
    assert!(dashboard.store().exists("sp500"));
    assert!(dashboard.stored("cpi").is_ok());
}

#[test]
fn growth_respects_trailing_window() {
    let dir = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(dir.path(), false)).with_synthetic(true);

    let view = dashboard.growth(6, today());
    assert_eq!(view.count, 2);
    assert!(view.data.values().all(|g| g.dates.len() == 6));
    assert_eq!(view.data["sp500"].dates.last().map(String::as_str), Some("Jun 2024"));
}

#[test]
fn offline_dashboard_serves_only_stored_series() {
    let dir = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(dir.path(), true));

    assert!(!dashboard.momentum(Period::OneYear, today()).success);

    let indicator = &dashboard.config().indicators[0];
    let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
    let series = Series::new(vec![d(5, 31), d(6, 3)], vec![5000.0, 5100.0]).unwrap();
    dashboard
        .store()
        .write(&StoredSeries::from_series(indicator, series, chrono::Utc::now()))
        .unwrap();

    let view = dashboard.momentum(Period::CurrentMonth, today());
    assert_eq!(view.count, 1);
    assert_eq!(view.data["sp500"].baseline_date, Some(d(5, 31)));
    assert!((view.data["sp500"].values[1] - 102.0).abs() < 1e-9);
}

#[test]
fn live_dashboard_does_not_serve_synthetic_series() {
    let dir = tempfile::tempdir().unwrap();
    let dev = Dashboard::new(config(dir.path(), false)).with_synthetic(true);
    assert_eq!(dev.momentum(Period::OneYear, today()).count, 2);
    assert!(dev.store().exists("sp500"));

    let live = Dashboard::new(config(dir.path(), true));
    let view = live.momentum(Period::OneYear, today());
    assert!(!view.success);
    assert_eq!(view.count, 0);
    assert_eq!(live.growth(6, today()).count, 0);

    // The synthetic dashboard still reads its own records.
    let dev_again = Dashboard::new(config(dir.path(), true)).with_synthetic(true);
    assert_eq!(dev_again.momentum(Period::OneYear, today()).count, 2);
}

#[test]
fn refresh_reports_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(dir.path(), false)).with_synthetic(true);

    let err = dashboard
        .refresh(&["gold".to_string()], false, today(), &Quiet)
        .unwrap_err();
    assert!(matches!(err, DashboardError::Config(_)));

    let summary = dashboard.refresh(&[], true, today(), &Quiet).unwrap();
    assert_eq!(summary.refreshed, vec!["sp500", "cpi"]);
}

#[test]
fn indicator_listing_joins_store_status() {
    let dir = tempfile::tempdir().unwrap();
    let dashboard = Dashboard::new(config(dir.path(), false)).with_synthetic(true);
    dashboard
        .refresh(&["cpi".to_string()], false, today(), &Quiet)
        .unwrap();

    let listing = dashboard.indicators();
    assert_eq!(listing.len(), 2);
    assert!(!listing[0].cached);
    assert!(listing[1].cached);
    assert!(listing[1].points > 0);
    assert!(listing[1].synthetic);
}

#[test]
fn admin_password_check() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), true);
    assert!(!Dashboard::new(cfg.clone()).verify_admin(""));

    cfg.admin.password = Some("hunter2".into());
    let dashboard = Dashboard::new(cfg);
    assert!(dashboard.verify_admin("hunter2"));
    assert!(!dashboard.verify_admin("hunter3"));
}
