//! Multi-series date alignment.
//!
//! Given momentum series for several indicators, truncate each one to the
//! dates every indicator has. No filling: a date missing from any series is
//! dropped from all of them.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use crate::domain::MomentumSeries;

/// Truncate every series to the intersection of all their dates.
///
/// Relative order is preserved and a date repeated within one series is kept
/// once, so every output carries the identical date sequence. An empty
/// intersection empties every series; `baseline_date` is left untouched.
pub fn align<K: Ord>(results: BTreeMap<K, MomentumSeries>) -> BTreeMap<K, MomentumSeries> {
    let common = common_dates(results.values());

    results
        .into_iter()
        .map(|(key, series)| (key, retain_dates(series, &common)))
        .collect()
}

fn common_dates<'a>(all: impl Iterator<Item = &'a MomentumSeries>) -> HashSet<NaiveDate> {
    let mut common: Option<HashSet<NaiveDate>> = None;
    for series in all {
        let dates: HashSet<NaiveDate> = series.dates.iter().copied().collect();
        common = Some(match common {
            None => dates,
            Some(acc) => acc.intersection(&dates).copied().collect(),
        });
    }
    common.unwrap_or_default()
}

fn retain_dates(series: MomentumSeries, keep: &HashSet<NaiveDate>) -> MomentumSeries {
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(keep.len());
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = series
        .dates
        .into_iter()
        .zip(series.values)
        .filter(|(date, _)| keep.contains(date) && seen.insert(*date))
        .unzip();

    MomentumSeries {
        dates,
        values,
        baseline_date: series.baseline_date,
    }
}
