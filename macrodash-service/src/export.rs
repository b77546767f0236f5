//! CSV export of the dashboard views.
//!
//! Both exports are wide: one row per date (or month), one column per
//! indicator, columns in indicator-key order. Cells are blank where an
//! indicator has no value for that row.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::dashboard::{ApiResponse, GrowthEntry, MomentumEntry};

/// Columns: date, then one rebased-value column per indicator.
pub fn momentum_csv(view: &ApiResponse<MomentumEntry>) -> Result<String> {
    let all_dates: BTreeSet<NaiveDate> = view
        .data
        .values()
        .flat_map(|e| e.dates.iter().copied())
        .collect();
    let lookup: BTreeMap<&str, HashMap<NaiveDate, f64>> = view
        .data
        .iter()
        .map(|(k, e)| (k.as_str(), e.dates.iter().copied().zip(e.values.iter().copied()).collect()))
        .collect();

    let rows = all_dates.iter().map(|date| (date.to_string(), *date));
    write_wide("date", &lookup, rows)
}

/// Columns: month, then one growth-percent column per indicator. Months run
/// in calendar order across all indicators.
pub fn growth_csv(view: &ApiResponse<GrowthEntry>) -> Result<String> {
    let mut months: BTreeMap<NaiveDate, String> = BTreeMap::new();
    let mut lookup: BTreeMap<&str, HashMap<NaiveDate, f64>> = BTreeMap::new();

    for (key, entry) in &view.data {
        let mut cells = HashMap::with_capacity(entry.dates.len());
        for (label, value) in entry.dates.iter().zip(&entry.values) {
            let month = parse_month_label(label)
                .with_context(|| format!("unrecognised month label '{label}' in {key}"))?;
            months.entry(month).or_insert_with(|| label.clone());
            cells.insert(month, *value);
        }
        lookup.insert(key.as_str(), cells);
    }

    let rows = months.into_iter().map(|(month, label)| (label, month));
    write_wide("month", &lookup, rows)
}

/// Write `csv` to `path`, creating parent directories.
pub fn write_csv(path: &Path, csv: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

fn parse_month_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {label}"), "%d %b %Y").ok()
}

fn write_wide(
    first_column: &str,
    lookup: &BTreeMap<&str, HashMap<NaiveDate, f64>>,
    rows: impl Iterator<Item = (String, NaiveDate)>,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec![first_column.to_string()];
    header.extend(lookup.keys().map(|k| k.to_string()));
    wtr.write_record(&header)?;

    for (label, key) in rows {
        let mut record = vec![label];
        for cells in lookup.values() {
            record.push(cells.get(&key).map_or_else(String::new, |v| format!("{v:.6}")));
        }
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
