//! End-to-end checks of the three dashboard scenarios, run through the
//! public transform API.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use macrodash_core::domain::{MomentumSeries, Period, Series};
use macrodash_core::transform::{align, momentum, monthly_growth, TransformError};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn series(points: &[(&str, f64)]) -> Series {
    Series::new(
        points.iter().map(|(s, _)| d(s)).collect(),
        points.iter().map(|(_, v)| *v).collect(),
    )
    .unwrap()
}

#[test]
fn month_end_closes_give_ten_percent_growth() {
    let s = series(&[("2024-01-31", 100.0), ("2024-02-29", 110.0)]);
    let g = monthly_growth(&s).unwrap();
    assert_eq!(g.dates, vec!["Feb 2024"]);
    assert!((g.values[0] - 10.0).abs() < 1e-12);
}

#[test]
fn one_month_momentum_rebases_at_resolved_baseline() {
    // 1m on 2024-04-15 targets the end of February.
    let today = d("2024-04-15");
    let s = series(&[
        ("2024-01-31", 80.0),
        ("2024-02-29", 100.0),
        ("2024-03-10", 105.0),
    ]);
    let m = momentum(&s, Period::OneMonth, today).unwrap();
    assert_eq!(m.baseline_date, Some(d("2024-02-29")));
    assert_eq!(m.dates, vec![d("2024-02-29"), d("2024-03-10")]);
    assert_eq!(m.values[0], 100.0);
    assert!((m.values[1] - 105.0).abs() < 1e-12);
}

#[test]
fn alignment_truncates_to_shared_dates() {
    let mk = |dates: &[&str]| MomentumSeries {
        dates: dates.iter().map(|s| d(s)).collect(),
        values: vec![100.0; dates.len()],
        baseline_date: Some(d(dates[0])),
    };
    let mut input = BTreeMap::new();
    input.insert("a", mk(&["2024-01-01", "2024-01-02", "2024-01-03"]));
    input.insert("b", mk(&["2024-01-02", "2024-01-03", "2024-01-04"]));

    let out = align(input);
    let shared = vec![d("2024-01-02"), d("2024-01-03")];
    assert_eq!(out["a"].dates, shared);
    assert_eq!(out["b"].dates, shared);
    assert_eq!(out["a"].baseline_date, Some(d("2024-01-01")));
}

#[test]
fn disjoint_series_align_to_empty() {
    let mk = |date: &str| MomentumSeries {
        dates: vec![d(date)],
        values: vec![100.0],
        baseline_date: Some(d(date)),
    };
    let mut input = BTreeMap::new();
    input.insert("a", mk("2024-01-01"));
    input.insert("b", mk("2024-06-01"));
    assert!(align(input).values().all(MomentumSeries::is_empty));
}

#[test]
fn series_starting_after_target_uses_nearest_date() {
    let today = d("2024-04-15");
    let s = series(&[("2024-03-05", 50.0), ("2024-03-06", 55.0)]);
    let m = momentum(&s, Period::OneYear, today).unwrap();
    assert_eq!(m.baseline_date, Some(d("2024-03-05")));
    assert_eq!(m.len(), 2);
}

#[test]
fn zero_values_are_reported_not_propagated() {
    let today = d("2024-04-15");
    let zero_base = series(&[("2024-02-29", 0.0), ("2024-03-10", 1.0)]);
    assert!(matches!(
        momentum(&zero_base, Period::OneMonth, today),
        Err(TransformError::ZeroBaseline { .. })
    ));

    let zero_month = series(&[("2024-01-31", 0.0), ("2024-02-29", 1.0)]);
    assert!(matches!(
        monthly_growth(&zero_month),
        Err(TransformError::ZeroDivisor { .. })
    ));
}
