//! Series transforms: momentum rebasing, date alignment and monthly growth.
//!
//! Everything here is a pure function over in-memory series. No I/O, no
//! shared state; callers recompute on every request.

pub mod align;
pub mod growth;
pub mod momentum;

pub use align::align;
pub use growth::{monthly_growth, monthly_last, MonthlyClose};
pub use momentum::{find_baseline, momentum, rebase_at, BaselineMatch};

use chrono::NaiveDate;
use thiserror::Error;

/// Failures while building or transforming a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("series has {dates} dates but {values} values")]
    LengthMismatch { dates: usize, values: usize },

    #[error("series dates go backwards at index {index} ({date})")]
    Unordered { index: usize, date: NaiveDate },

    #[error("series value on {date} is {value}; values must be finite")]
    NonFinite { date: NaiveDate, value: f64 },

    #[error("baseline value on {date} is {value}; cannot rebase to 100")]
    ZeroBaseline { date: NaiveDate, value: f64 },

    #[error("value for {month} is {value}; cannot compute growth for the following month")]
    ZeroDivisor { month: String, value: f64 },

    #[error("baseline target date is outside the supported calendar range")]
    DateOutOfRange,
}
