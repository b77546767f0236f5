//! API route handlers.
//!
//! Every handler that touches the store or a provider runs the work on the
//! blocking pool; the dashboard itself is synchronous.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use macrodash_core::data::{DataError, TracingProgress};
use macrodash_core::domain::Period;
use macrodash_service::{Dashboard, DashboardError, DEFAULT_GROWTH_MONTHS};

use crate::etag::json_with_etag;
use crate::AppState;

/// Header carrying the shared admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// `{success: false, error}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        let status = match e {
            DataError::NoStoredData { .. } => StatusCode::NOT_FOUND,
            DataError::InvalidIndicator(_) => StatusCode::BAD_REQUEST,
            DataError::CircuitBreakerTripped | DataError::RateLimited { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.user_message())
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Config(e) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            DashboardError::Data(e) => e.into(),
        }
    }
}

/// Run `f` against the dashboard on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Dashboard) -> T + Send + 'static,
{
    let dashboard = state.dashboard.clone();
    tokio::task::spawn_blocking(move || f(dashboard.as_ref()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "blocking task failed");
            ApiError::internal("internal error")
        })
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let candidate = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if state.dashboard.verify_admin(candidate) {
        Ok(())
    } else {
        tracing::warn!("rejected admin request");
        Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid admin password"))
    }
}

// ── Views ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MomentumQuery {
    pub period: Option<String>,
}

pub async fn momentum(
    State(state): State<AppState>,
    Query(query): Query<MomentumQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let period = query
        .period
        .as_deref()
        .map_or_else(Period::default, Period::parse_or_fallback);
    let today = state.today();
    let view = blocking(&state, move |d| d.momentum(period, today)).await?;
    Ok(json_with_etag(&headers, &view))
}

#[derive(Debug, Deserialize)]
pub struct GrowthQuery {
    pub months: Option<usize>,
}

pub async fn growth(
    State(state): State<AppState>,
    Query(query): Query<GrowthQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let months = query.months.unwrap_or(DEFAULT_GROWTH_MONTHS);
    let today = state.today();
    let view = blocking(&state, move |d| d.growth(months, today)).await?;
    Ok(json_with_etag(&headers, &view))
}

pub async fn indicators(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let listing = blocking(&state, |d| d.indicators()).await?;
    let count = listing.len();
    Ok(json_with_etag(
        &headers,
        &json!({ "success": true, "data": listing, "count": count }),
    ))
}

pub async fn series(
    State(state): State<AppState>,
    Path(indicator): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let record = blocking(&state, move |d| d.stored(&indicator)).await??;
    Ok(json_with_etag(
        &headers,
        &json!({ "success": true, "data": record }),
    ))
}

// ── Admin ────────────────────────────────────────────────────────────

pub async fn admin_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshFailure {
    pub indicator: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub refreshed: Vec<String>,
    pub failed: Vec<RefreshFailure>,
}

/// Refetch indicators from their providers, one at a time. Only one refresh
/// runs at a time; a concurrent request gets 409.
pub async fn admin_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RefreshResponse>, ApiError> {
    require_admin(&state, &headers)?;

    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid body: {e}")))?
    };

    let _guard = state
        .refresh_lock
        .try_lock()
        .map_err(|_| ApiError::new(StatusCode::CONFLICT, "a refresh is already running"))?;

    let today = state.today();
    let summary = blocking(&state, move |d| {
        d.refresh(&request.indicators, true, today, &TracingProgress)
    })
    .await??;

    let failed: Vec<RefreshFailure> = summary
        .errors
        .iter()
        .map(|(indicator, e)| RefreshFailure {
            indicator: indicator.clone(),
            error: e.user_message(),
        })
        .collect();

    Ok(Json(RefreshResponse {
        success: failed.is_empty(),
        refreshed: summary.refreshed,
        failed,
    }))
}

// ── Health ───────────────────────────────────────────────────────────

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "synthetic": state.dashboard.is_synthetic(),
        "providers": state.dashboard.provider_health(),
    }))
}
