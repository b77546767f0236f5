//! Month-over-month growth from the last observation of each calendar month.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use super::TransformError;
use crate::domain::{GrowthSeries, Series};

/// The last observation that falls in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyClose {
    pub year: i32,
    pub month: u32,
    /// Date of the observation that closed the month.
    pub date: NaiveDate,
    pub value: f64,
}

impl MonthlyClose {
    /// `"Feb 2024"` style label.
    pub fn label(&self) -> String {
        self.date.format("%b %Y").to_string()
    }
}

/// One entry per calendar month present, ascending; later observations win.
pub fn monthly_last(series: &Series) -> Vec<MonthlyClose> {
    let mut buckets: BTreeMap<(i32, u32), (NaiveDate, f64)> = BTreeMap::new();
    for (date, value) in series.iter() {
        buckets.insert((date.year(), date.month()), (date, value));
    }

    buckets
        .into_iter()
        .map(|((year, month), (date, value))| MonthlyClose {
            year,
            month,
            date,
            value,
        })
        .collect()
}

/// Percentage change between consecutive monthly closes.
///
/// The first month present only seeds the first change, so the output has
/// one point fewer than the number of distinct months (none for ≤ 1 month).
pub fn monthly_growth(series: &Series) -> Result<GrowthSeries, TransformError> {
    let closes = monthly_last(series);
    let mut out = GrowthSeries {
        dates: Vec::with_capacity(closes.len().saturating_sub(1)),
        values: Vec::with_capacity(closes.len().saturating_sub(1)),
    };

    for pair in closes.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if prev.value == 0.0 || !prev.value.is_finite() {
            return Err(TransformError::ZeroDivisor {
                month: prev.label(),
                value: prev.value,
            });
        }
        out.dates.push(cur.label());
        out.values.push((cur.value - prev.value) / prev.value * 100.0);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn two_months_give_one_growth_point() {
        let s = series(&[("2024-01-31", 100.0), ("2024-02-29", 110.0)]);
        let g = monthly_growth(&s).unwrap();
        assert_eq!(g.dates, vec!["Feb 2024"]);
        assert!((g.values[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn last_observation_of_month_wins() {
        let s = series(&[
            ("2024-01-10", 50.0),
            ("2024-01-31", 100.0),
            ("2024-02-01", 500.0),
            ("2024-02-28", 90.0),
        ]);
        let closes = monthly_last(&s);
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].value, 100.0);
        assert_eq!(closes[1].date, d("2024-02-28"));

        let g = monthly_growth(&s).unwrap();
        assert!((g.values[0] - -10.0).abs() < 1e-9);
    }

    #[test]
    fn months_with_gaps_compare_consecutive_present_months() {
        let s = series(&[("2024-01-31", 100.0), ("2024-04-30", 120.0)]);
        let g = monthly_growth(&s).unwrap();
        assert_eq!(g.dates, vec!["Apr 2024"]);
        assert!((g.values[0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn single_month_or_empty_gives_nothing() {
        let one = series(&[("2024-01-02", 1.0), ("2024-01-30", 2.0)]);
        assert!(monthly_growth(&one).unwrap().is_empty());
        assert!(monthly_growth(&Series::empty()).unwrap().is_empty());
    }

    #[test]
    fn labels_cross_year_boundary() {
        let s = series(&[("2023-12-29", 200.0), ("2024-01-31", 210.0)]);
        let g = monthly_growth(&s).unwrap();
        assert_eq!(g.dates, vec!["Jan 2024"]);
    }

    #[test]
    fn zero_previous_month_is_an_error() {
        let s = series(&[("2024-01-31", 0.0), ("2024-02-29", 1.0)]);
        let err = monthly_growth(&s).unwrap_err();
        assert_eq!(
            err,
            TransformError::ZeroDivisor {
                month: "Jan 2024".into(),
                value: 0.0
            }
        );
    }

    #[test]
    fn zero_in_final_month_is_fine() {
        let s = series(&[("2024-01-31", 4.0), ("2024-02-29", 0.0)]);
        let g = monthly_growth(&s).unwrap();
        assert_eq!(g.values, vec![-100.0]);
    }
}
