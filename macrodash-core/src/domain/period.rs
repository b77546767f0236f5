//! Baseline period selector for the momentum view.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far back the momentum baseline sits.
///
/// Each period maps to a fixed calendar-month offset, not a day count: the
/// target date is the last day of the month that lies `months_back()`
/// months before the current month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Fallback for unrecognised selectors: baseline at the previous month end.
    #[serde(rename = "current")]
    CurrentMonth,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "6m")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "4y")]
    FourYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::OneMonth,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::ThreeYears,
        Period::FourYears,
        Period::FiveYears,
    ];

    pub fn months_back(self) -> u32 {
        match self {
            Period::CurrentMonth => 1,
            Period::OneMonth => 2,
            Period::SixMonths => 6,
            Period::OneYear => 12,
            Period::TwoYears => 24,
            Period::ThreeYears => 36,
            Period::FourYears => 48,
            Period::FiveYears => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::CurrentMonth => "current",
            Period::OneMonth => "1m",
            Period::SixMonths => "6m",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::ThreeYears => "3y",
            Period::FourYears => "4y",
            Period::FiveYears => "5y",
        }
    }

    /// Parse a selector, falling back to [`Period::CurrentMonth`] when unknown.
    pub fn parse_or_fallback(s: &str) -> Self {
        s.parse().unwrap_or(Period::CurrentMonth)
    }

    /// The baseline target date for this period relative to `today`.
    ///
    /// Returns `None` only when the arithmetic leaves chrono's date range.
    pub fn target_date(self, today: NaiveDate) -> Option<NaiveDate> {
        let months = today.year() * 12 + today.month0() as i32 - self.months_back() as i32;
        month_end(months.div_euclid(12), months.rem_euclid(12) as u32 + 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown period selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period '{0}' (expected one of 1m, 6m, 1y, 2y, 3y, 4y, 5y)")]
pub struct UnknownPeriod(pub String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(Period::CurrentMonth),
            "1m" => Ok(Period::OneMonth),
            "6m" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "3y" => Ok(Period::ThreeYears),
            "4y" => Ok(Period::FourYears),
            "5y" => Ok(Period::FiveYears),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// Last calendar day of `year`-`month`.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn one_month_is_end_of_month_before_previous() {
        let today = d(2026, 10, 19);
        assert_eq!(Period::OneMonth.target_date(today), Some(d(2026, 8, 31)));
    }

    #[test]
    fn current_month_is_previous_month_end() {
        assert_eq!(
            Period::CurrentMonth.target_date(d(2026, 10, 19)),
            Some(d(2026, 9, 30))
        );
    }

    #[test]
    fn yearly_periods_land_on_same_month_end() {
        let today = d(2026, 10, 19);
        assert_eq!(Period::OneYear.target_date(today), Some(d(2025, 10, 31)));
        assert_eq!(Period::FiveYears.target_date(today), Some(d(2021, 10, 31)));
    }

    #[test]
    fn crosses_year_boundary() {
        let today = d(2024, 1, 15);
        assert_eq!(Period::OneMonth.target_date(today), Some(d(2023, 11, 30)));
        assert_eq!(Period::SixMonths.target_date(today), Some(d(2023, 7, 31)));
    }

    #[test]
    fn handles_leap_february() {
        assert_eq!(
            Period::CurrentMonth.target_date(d(2024, 3, 10)),
            Some(d(2024, 2, 29))
        );
        assert_eq!(month_end(2023, 2), Some(d(2023, 2, 28)));
        assert_eq!(month_end(2023, 12), Some(d(2023, 12, 31)));
    }

    #[test]
    fn parse_and_fallback() {
        assert_eq!("1y".parse::<Period>(), Ok(Period::OneYear));
        assert_eq!(" 6M ".parse::<Period>(), Ok(Period::SixMonths));
        assert!("10y".parse::<Period>().is_err());
        assert_eq!(Period::parse_or_fallback("bogus"), Period::CurrentMonth);
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for p in Period::ALL {
            assert_eq!(p.to_string().parse::<Period>(), Ok(p));
        }
    }
}
