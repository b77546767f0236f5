//! Blocking JSON GET with retry, backoff and circuit-breaker bookkeeping.
//!
//! Shared by the FRED and Yahoo providers. Status handling:
//! - 403 trips the breaker immediately (ban)
//! - 429 and 5xx count as failures and are retried with exponential backoff;
//!   a 429 waits at least as long as its `Retry-After` asks, and gives up at
//!   once when that exceeds `max_wait`
//! - 401 is an authentication error, never retried
//! - 400/404 mean the series id or ticker is unknown

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
    max_wait: Duration,
}

/// `Retry-After` when a 429 carries none (or an HTTP-date we do not parse).
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

impl HttpFetcher {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_wait: Duration::from_secs(10),
        })
    }

    pub fn with_retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Longest pause a single retry may take before the request is abandoned.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// GET `url` and decode the JSON body. `id` names the requested series in
    /// errors; the URL itself is never logged since it may carry an API key.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, id: &str) -> Result<T, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt, retry_after.take());
                tracing::debug!(id, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            if !self.breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) => {
                    let e = e.without_url();
                    if e.is_connect() || e.is_timeout() {
                        self.breaker.record_failure();
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.breaker.trip();
                tracing::warn!(id, "provider returned 403; circuit breaker tripped");
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.breaker.record_failure();
                let secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                let rate_limited = DataError::RateLimited {
                    retry_after_secs: secs,
                };
                let wait = Duration::from_secs(secs);
                if wait > self.max_wait || attempt == self.max_retries {
                    tracing::warn!(id, retry_after_secs = secs, "rate limited; not retrying");
                    return Err(rate_limited);
                }
                retry_after = Some(wait);
                last_error = Some(rate_limited);
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(format!(
                    "provider refused credentials for {id}"
                )));
            }

            if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND
            {
                let body = resp.text().unwrap_or_default();
                if body.contains("api_key") {
                    return Err(DataError::AuthenticationRequired(
                        "API key missing or not registered".into(),
                    ));
                }
                return Err(DataError::SymbolNotFound {
                    symbol: id.to_string(),
                });
            }

            if !status.is_success() {
                self.breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {id}")));
                continue;
            }

            let parsed: T = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {id}: {}",
                    e.without_url()
                ))
            })?;
            self.breaker.record_success();
            return Ok(parsed);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Pause before retry `attempt` (1-based): exponential backoff, stretched to
/// the provider's `Retry-After` when that is longer.
fn retry_delay(base: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    let backoff = base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    retry_after.map_or(backoff, |wait| wait.max(backoff))
}

/// Delay-seconds form of `Retry-After`.
fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}
