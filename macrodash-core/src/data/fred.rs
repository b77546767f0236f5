//! FRED (Federal Reserve Economic Data) statistics provider, keyed by series id.
//!
//! Uses the `series/observations` endpoint. Missing observations come back
//! as the literal string `"."` and are skipped.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::circuit_breaker::CircuitBreaker;
use super::http::HttpFetcher;
use super::provider::{DataError, DataOrigin, FetchResult, SeriesProvider};
use crate::domain::Series;

const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

pub struct FredProvider {
    http: HttpFetcher,
    api_key: Option<String>,
    base_url: String,
}

impl FredProvider {
    pub fn new(api_key: Option<String>, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Ok(Self {
            http: HttpFetcher::new(circuit_breaker)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn observations_url(&self, api_key: &str, series_id: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/fred/series/observations?series_id={series_id}&api_key={api_key}\
             &file_type=json&observation_start={start}&observation_end={end}",
            self.base_url
        )
    }

    fn parse_response(series_id: &str, resp: ObservationsResponse) -> Result<Series, DataError> {
        let mut observations = Vec::with_capacity(resp.observations.len());
        for obs in resp.observations {
            if obs.value.trim() == "." {
                continue;
            }
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").map_err(|e| {
                DataError::ResponseFormatChanged(format!("bad observation date '{}': {e}", obs.date))
            })?;
            let value: f64 = obs.value.trim().parse().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "bad observation value '{}' on {}: {e}",
                    obs.value, obs.date
                ))
            })?;
            observations.push((date, value));
        }

        let series = Series::from_observations(observations);
        if series.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: series_id.to_string(),
            });
        }
        Ok(series)
    }
}

impl SeriesProvider for FredProvider {
    fn name(&self) -> &str {
        "fred"
    }

    fn fetch(
        &self,
        source_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DataError::AuthenticationRequired(
                "FRED API key is not configured (set FRED_API_KEY or [fred].api_key)".into(),
            ));
        };
        if !source_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DataError::SymbolNotFound {
                symbol: source_id.to_string(),
            });
        }

        let url = self.observations_url(api_key, source_id, start, end);
        let resp: ObservationsResponse = self.http.get_json(&url, source_id)?;
        let series = Self::parse_response(source_id, resp)?;
        Ok(FetchResult {
            source_id: source_id.to_string(),
            series,
            origin: DataOrigin::Fred,
        })
    }

    fn is_available(&self) -> bool {
        self.http.breaker().is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(key: Option<&str>) -> FredProvider {
        FredProvider::new(
            key.map(String::from),
            Arc::new(CircuitBreaker::default_provider()),
        )
        .unwrap()
    }

    #[test]
    fn parses_observations_and_skips_missing() {
        let json = r#"{"observations":[
            {"realtime_start":"2024-05-01","realtime_end":"2024-05-01","date":"2024-01-01","value":"308.417"},
            {"realtime_start":"2024-05-01","realtime_end":"2024-05-01","date":"2024-02-01","value":"."},
            {"realtime_start":"2024-05-01","realtime_end":"2024-05-01","date":"2024-03-01","value":"312.230"}
        ]}"#;
        let resp: ObservationsResponse = serde_json::from_str(json).unwrap();
        let s = FredProvider::parse_response("CPIAUCSL", resp).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.values(), &[308.417, 312.230]);
    }

    #[test]
    fn garbage_value_is_format_change() {
        let json = r#"{"observations":[{"date":"2024-01-01","value":"n/a"}]}"#;
        let resp: ObservationsResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            FredProvider::parse_response("DGS10", resp),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn no_observations_is_not_found() {
        let resp: ObservationsResponse = serde_json::from_str(r#"{"observations":[]}"#).unwrap();
        assert!(matches!(
            FredProvider::parse_response("NOPE", resp),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn missing_api_key_fails_without_network() {
        let p = provider(Some("  "));
        assert!(!p.has_api_key());
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            p.fetch("DGS10", d, d),
            Err(DataError::AuthenticationRequired(_))
        ));
    }

    #[test]
    fn rejects_suspicious_series_ids() {
        let p = provider(Some("key"));
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            p.fetch("DGS10&api_key=x", d, d),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn url_carries_range_and_json_format() {
        let p = provider(Some("abc")).with_base_url("http://localhost:9");
        let url = p.observations_url(
            "abc",
            "DGS10",
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        assert!(url.starts_with("http://localhost:9/fred/series/observations?series_id=DGS10"));
        assert!(url.contains("file_type=json"));
        assert!(url.contains("observation_start=2020-01-01&observation_end=2024-12-31"));
    }
}
