//! Momentum index: rebase a series to 100 at a historical baseline date.

use chrono::NaiveDate;

use super::TransformError;
use crate::domain::{MomentumSeries, Period, Series};

/// Outcome of the two-phase baseline search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineMatch {
    /// Latest observation on or before the target date.
    OnOrBefore(usize),
    /// Every observation is after the target; closest one by absolute distance.
    Nearest(usize),
    /// The series is empty.
    NotFound,
}

impl BaselineMatch {
    pub fn index(self) -> Option<usize> {
        match self {
            BaselineMatch::OnOrBefore(i) | BaselineMatch::Nearest(i) => Some(i),
            BaselineMatch::NotFound => None,
        }
    }
}

/// Locate the baseline index for `target` in ascending `dates`.
pub fn find_baseline(dates: &[NaiveDate], target: NaiveDate) -> BaselineMatch {
    if let Some(i) = latest_on_or_before(dates, target) {
        return BaselineMatch::OnOrBefore(i);
    }
    match nearest(dates, target) {
        Some(i) => BaselineMatch::Nearest(i),
        None => BaselineMatch::NotFound,
    }
}

// Minimal non-negative distance; strict `<` keeps the first of repeated dates.
fn latest_on_or_before(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, date) in dates.iter().enumerate() {
        let diff = (target - *date).num_days();
        if diff >= 0 && best.map_or(true, |(_, b)| diff < b) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i)
}

fn nearest(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    dates
        .iter()
        .enumerate()
        .min_by_key(|(_, date)| (**date - target).num_days().abs())
        .map(|(i, _)| i)
}

/// Momentum view of `series` for the baseline `period`, relative to `today`.
pub fn momentum(
    series: &Series,
    period: Period,
    today: NaiveDate,
) -> Result<MomentumSeries, TransformError> {
    let target = period
        .target_date(today)
        .ok_or(TransformError::DateOutOfRange)?;
    rebase_at(series, target)
}

/// Rebase `series` to 100 at the baseline resolved for `target`.
///
/// Output dates are the contiguous suffix of the input starting at the
/// baseline; the first value is exactly 100.
pub fn rebase_at(series: &Series, target: NaiveDate) -> Result<MomentumSeries, TransformError> {
    let Some(index) = find_baseline(series.dates(), target).index() else {
        return Ok(MomentumSeries::empty());
    };

    let baseline_date = series.dates()[index];
    let baseline_value = series.values()[index];
    if baseline_value == 0.0 || !baseline_value.is_finite() {
        return Err(TransformError::ZeroBaseline {
            date: baseline_date,
            value: baseline_value,
        });
    }

    Ok(MomentumSeries {
        dates: series.dates()[index..].to_vec(),
        values: series.values()[index..]
            .iter()
            .map(|v| v / baseline_value * 100.0)
            .collect(),
        baseline_date: Some(baseline_date),
    })
}
