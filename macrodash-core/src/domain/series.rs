//! Series: the fundamental time-series unit, plus the derived views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::transform::TransformError;

/// An ordered run of `(date, value)` observations for one indicator.
///
/// Dates are non-decreasing and `dates.len() == values.len()` always holds;
/// the fields are private so the invariant can only be established through
/// [`Series::new`] or [`Series::from_observations`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries", into = "RawSeries")]
pub struct Series {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TryFrom<RawSeries> for Series {
    type Error = TransformError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Series::new(raw.dates, raw.values)
    }
}

impl From<Series> for RawSeries {
    fn from(series: Series) -> Self {
        RawSeries {
            dates: series.dates,
            values: series.values,
        }
    }
}

impl Series {
    /// Build a series from parallel arrays.
    ///
    /// Fails if the lengths differ, the dates go backwards or a value is NaN
    /// or infinite.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, TransformError> {
        if dates.len() != values.len() {
            return Err(TransformError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite {
                date: dates[i],
                value: values[i],
            });
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] < w[0]) {
            return Err(TransformError::Unordered {
                index: i + 1,
                date: dates[i + 1],
            });
        }
        Ok(Self { dates, values })
    }

    /// Build a series from unordered provider observations.
    ///
    /// Sorts by date, drops non-finite values and keeps the last observation
    /// for any repeated date.
    pub fn from_observations(mut observations: Vec<(NaiveDate, f64)>) -> Self {
        observations.retain(|(_, v)| v.is_finite());
        observations.sort_by_key(|(d, _)| *d);

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(observations.len());
        let mut values: Vec<f64> = Vec::with_capacity(observations.len());
        for (date, value) in observations {
            if dates.last() == Some(&date) {
                if let Some(last) = values.last_mut() {
                    *last = value;
                }
                continue;
            }
            dates.push(date);
            values.push(value);
        }
        Self { dates, values }
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Iterate over `(date, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<f64>) {
        (self.dates, self.values)
    }
}

/// A series rebased to 100 at `baseline_date`.
///
/// Only dates on or after the baseline are present. `baseline_date` is
/// `None` when the source series was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub baseline_date: Option<NaiveDate>,
}

impl MomentumSeries {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
            baseline_date: None,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Month-over-month percentage changes, labelled `"Mon YYYY"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

impl GrowthSeries {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Keep only the trailing `months` points.
    pub fn tail(mut self, months: usize) -> Self {
        let skip = self.dates.len().saturating_sub(months);
        self.dates.drain(..skip);
        self.values.drain(..skip);
        self
    }
}
