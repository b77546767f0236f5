//! MacroDash Server: the dashboard's HTTP surface.
//!
//! JSON API under `/api`, a health probe, and the dashboard's static assets
//! for every other path.

pub mod etag;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use macrodash_service::Dashboard;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "macrodash=info,tower_http=info";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Dashboard>,
    refresh_lock: Arc<Mutex<()>>,
    fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            refresh_lock: Arc::new(Mutex::new(())),
            fixed_today: None,
        }
    }

    /// Pin the date the views are computed against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Build the router: API routes, then static assets as the fallback.
pub fn router(state: AppState) -> Router {
    let static_dir = state.dashboard.config().server.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/momentum", get(routes::momentum))
        .route("/api/growth", get(routes::growth))
        .route("/api/indicators", get(routes::indicators))
        .route("/api/series/:indicator", get(routes::series))
        .route("/api/admin/verify", post(routes::admin_verify))
        .route("/api/admin/refresh", post(routes::admin_refresh))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(dashboard: Dashboard) -> Result<()> {
    let config = dashboard.config();
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.bind_addr()))?;
    if config.admin.password.is_none() {
        tracing::warn!("no admin password configured; admin endpoints will reject all requests");
    }
    if !config.server.static_dir.is_dir() {
        tracing::warn!(
            dir = %config.server.static_dir.display(),
            "static asset directory not found"
        );
    }

    let app = router(AppState::new(dashboard));

    tracing::info!("macrodash-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Install the fmt subscriber, honouring `RUST_LOG` when set.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
