//! Dashboard views: the momentum and growth API payloads.
//!
//! View assembly owns no transformation logic. It runs the core transforms
//! over stored series, drops indicators that cannot be transformed, aligns
//! momentum series and windows growth series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use macrodash_core::data::StoredSeries;
use macrodash_core::domain::{GrowthSeries, MomentumSeries, Period};
use macrodash_core::transform::{align, momentum, monthly_growth};

/// Default trailing window for the growth view.
pub const DEFAULT_GROWTH_MONTHS: usize = 24;

/// `{success, data, count}` envelope shared by both views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: BTreeMap<String, T>,
    pub count: usize,
}

impl<T> ApiResponse<T> {
    pub fn from_data(data: BTreeMap<String, T>) -> Self {
        let count = data.len();
        Self {
            success: count > 0,
            data,
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumEntry {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub baseline_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEntry {
    pub name: String,
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

/// Momentum for every record, rebased for `period` and aligned to the dates
/// all of them share.
pub fn momentum_view(
    records: &[&StoredSeries],
    period: Period,
    today: NaiveDate,
) -> ApiResponse<MomentumEntry> {
    let mut names = BTreeMap::new();
    let mut rebased: BTreeMap<String, MomentumSeries> = BTreeMap::new();

    for record in records {
        let result = record
            .series()
            .and_then(|series| momentum(&series, period, today));
        match result {
            Ok(m) if m.is_empty() => {
                tracing::debug!(indicator = %record.indicator, "empty series omitted from momentum");
            }
            Ok(m) => {
                names.insert(record.indicator.clone(), record.name.clone());
                rebased.insert(record.indicator.clone(), m);
            }
            Err(e) => {
                tracing::warn!(indicator = %record.indicator, error = %e, "omitted from momentum");
            }
        }
    }

    let data = align(rebased)
        .into_iter()
        .map(|(key, m)| {
            let name = names.remove(&key).unwrap_or_else(|| key.clone());
            let entry = MomentumEntry {
                name,
                dates: m.dates,
                values: m.values,
                baseline_date: m.baseline_date,
            };
            (key, entry)
        })
        .collect();

    ApiResponse::from_data(data)
}

/// Month-over-month growth for every record, each cut to its own trailing
/// `months` window. Growth series are not aligned.
pub fn growth_view(records: &[&StoredSeries], months: usize) -> ApiResponse<GrowthEntry> {
    let mut data = BTreeMap::new();

    for record in records {
        let result = record.series().and_then(|series| monthly_growth(&series));
        match result {
            Ok(g) if g.is_empty() => {
                tracing::debug!(indicator = %record.indicator, "fewer than two months; omitted from growth");
            }
            Ok(g) => {
                let GrowthSeries { dates, values } = g.tail(months);
                data.insert(
                    record.indicator.clone(),
                    GrowthEntry {
                        name: record.name.clone(),
                        dates,
                        values,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(indicator = %record.indicator, error = %e, "omitted from growth");
            }
        }
    }

    ApiResponse::from_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use macrodash_core::domain::{Indicator, Series, SourceKind};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(key: &str, points: &[(&str, f64)]) -> StoredSeries {
        let indicator = Indicator::new(key, key.to_uppercase(), SourceKind::Fred, key, "test");
        let series = Series::new(
            points.iter().map(|(s, _)| d(s)).collect(),
            points.iter().map(|(_, v)| *v).collect(),
        )
        .unwrap();
        let at = Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap();
        StoredSeries::from_series(&indicator, series, at)
    }

    #[test]
    fn momentum_view_aligns_and_names_entries() {
        let a = record("a", &[("2024-02-28", 50.0), ("2024-02-29", 100.0), ("2024-03-01", 150.0)]);
        let b = record("b", &[("2024-02-29", 20.0), ("2024-03-01", 10.0), ("2024-03-04", 30.0)]);

        let view = momentum_view(&[&a, &b], Period::OneMonth, d("2024-04-15"));
        assert!(view.success);
        assert_eq!(view.count, 2);
        assert_eq!(view.data["a"].name, "A");
        assert_eq!(view.data["a"].dates, view.data["b"].dates);
        assert_eq!(view.data["a"].values, vec![100.0, 150.0]);
        assert_eq!(view.data["b"].values, vec![100.0, 50.0]);
        assert_eq!(view.data["b"].baseline_date, Some(d("2024-02-29")));
    }

    #[test]
    fn zero_baseline_indicator_is_omitted() {
        let ok = record("ok", &[("2024-02-29", 1.0), ("2024-03-01", 2.0)]);
        let zero = record("zero", &[("2024-02-29", 0.0), ("2024-03-01", 2.0)]);
        let view = momentum_view(&[&ok, &zero], Period::OneMonth, d("2024-04-15"));
        assert_eq!(view.count, 1);
        assert!(view.data.contains_key("ok"));
    }

    #[test]
    fn zero_month_close_drops_indicator_from_growth() {
        let ok = record("ok", &[("2024-01-31", 10.0), ("2024-02-29", 11.0)]);
        let zero = record(
            "zero",
            &[("2024-01-31", 0.0), ("2024-02-29", 5.0), ("2024-03-28", 6.0)],
        );
        let view = growth_view(&[&zero, &ok], DEFAULT_GROWTH_MONTHS);
        assert!(view.success);
        assert_eq!(view.count, 1);
        assert!(!view.data.contains_key("zero"));
        assert!((view.data["ok"].values[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn no_usable_indicator_is_unsuccessful() {
        let empty = record("empty", &[]);
        let view = momentum_view(&[&empty], Period::OneYear, d("2024-04-15"));
        assert!(!view.success);
        assert_eq!(view.count, 0);
        assert!(!growth_view(&[], DEFAULT_GROWTH_MONTHS).success);
    }

    #[test]
    fn growth_view_windows_each_series_independently() {
        let long = record(
            "long",
            &[
                ("2023-10-31", 100.0),
                ("2023-11-30", 110.0),
                ("2023-12-29", 121.0),
                ("2024-01-31", 121.0),
            ],
        );
        let short = record("short", &[("2024-01-15", 10.0), ("2024-02-15", 12.0)]);

        let view = growth_view(&[&long, &short], 2);
        assert_eq!(view.count, 2);
        assert_eq!(view.data["long"].dates, vec!["Dec 2023", "Jan 2024"]);
        assert_eq!(view.data["short"].dates, vec!["Feb 2024"]);
        assert!((view.data["short"].values[0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn momentum_entry_uses_wire_field_names() {
        let a = record("a", &[("2024-02-29", 100.0)]);
        let view = momentum_view(&[&a], Period::OneMonth, d("2024-04-15"));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"]["a"]["baselineDate"], "2024-02-29");
        assert_eq!(json["data"]["a"]["dates"][0], "2024-02-29");
    }
}
