//! Yahoo Finance quotes provider.
//!
//! Fetches daily adjusted closes from Yahoo's v8 chart API, keyed by ticker symbol
//! (equity indices, futures such as `GC=F`, FX pairs such as `EURUSD=X`).
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `ResponseFormatChanged`.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::circuit_breaker::CircuitBreaker;
use super::http::HttpFetcher;
use super::provider::{DataError, DataOrigin, FetchResult, SeriesProvider};
use crate::domain::Series;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    http: HttpFetcher,
    base_url: String,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Ok(Self {
            http: HttpFetcher::new(circuit_breaker)?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a different host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map_or(start_ts, |dt| dt.and_utc().timestamp());
        let symbol = encode_symbol(symbol);
        format!(
            "{}/v8/finance/chart/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d",
            self.base_url
        )
    }

    /// Parse the chart API response into a close-price series. Adjusted
    /// closes are used when Yahoo sends them for every timestamp; indices
    /// and FX pairs often omit them, so raw closes are the fallback.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Series, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let adjusted = data
            .indicators
            .adjclose
            .and_then(|a| a.into_iter().next())
            .map(|a| a.adjclose)
            .filter(|a| a.len() == timestamps.len());
        let closes = match adjusted {
            Some(closes) => closes,
            None => {
                data.indicators
                    .quote
                    .into_iter()
                    .next()
                    .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?
                    .close
            }
        };

        let mut observations = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Null closes are holidays or halted sessions.
            let Some(close) = closes.get(i).copied().flatten() else {
                continue;
            };
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;
            observations.push((date, close));
        }

        let series = Series::from_observations(observations);
        if series.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(series)
    }
}

// Tickers carry `^` and `=`; both must be escaped in a path segment.
fn encode_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            '^' => "%5E".to_string(),
            '=' => "%3D".to_string(),
            c => c.to_string(),
        })
        .collect()
}

impl SeriesProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        source_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let url = self.chart_url(source_id, start, end);
        let chart: ChartResponse = self.http.get_json(&url, source_id)?;
        let series = Self::parse_response(source_id, chart)?;
        Ok(FetchResult {
            source_id: source_id.to_string(),
            series,
            origin: DataOrigin::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.http.breaker().is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Series, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("^GSPC", resp)
    }

    #[test]
    fn parses_closes_and_skips_nulls() {
        // 2024-01-02 14:30 UTC, 2024-01-03, 2024-01-04
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"close":[4742.83,null,4688.68]}]}
        }],"error":null}}"#;
        let s = parse(json).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(
            s.dates()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(s.values(), &[4742.83, 4688.68]);
    }

    #[test]
    fn prefers_adjusted_closes() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200],
            "indicators":{
                "quote":[{"close":[2064.4,2041.0]}],
                "adjclose":[{"adjclose":[2060.0,null]}]
            }
        }],"error":null}}"#;
        let s = parse(json).unwrap();
        assert_eq!(s.values(), &[2060.0]);
    }

    #[test]
    fn short_adjusted_array_falls_back_to_close() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200],
            "indicators":{
                "quote":[{"close":[2064.4,2041.0]}],
                "adjclose":[{"adjclose":[2060.0]}]
            }
        }],"error":null}}"#;
        assert_eq!(parse(json).unwrap().values(), &[2064.4, 2041.0]);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(
            parse(json),
            Err(DataError::SymbolNotFound { symbol }) if symbol == "^GSPC"
        ));
    }

    #[test]
    fn other_chart_error_is_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn all_null_closes_is_not_found() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800],
            "indicators":{"quote":[{"close":[null]}]}
        }],"error":null}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn url_escapes_index_and_fx_tickers() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        let provider = YahooProvider::new(breaker)
            .unwrap()
            .with_base_url("http://localhost:9");
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let url = provider.chart_url("^GSPC", start, end);
        assert!(url.starts_with("http://localhost:9/v8/finance/chart/%5EGSPC?period1=1704067200"));
        assert!(provider.chart_url("EURUSD=X", start, end).contains("EURUSD%3DX"));
    }
}
