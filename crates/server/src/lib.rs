//! HTTP API for docqa.
//!
//! Thin axum layer over [`QaService`]: every handler parses its request,
//! calls the service, and maps [`docqa_core::AppError`] to a status code.

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use rate_limit::{RateLimiter, RouteLimits};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use docqa_core::{AppConfig, AppError, AppResult};
use docqa_knowledge::QaService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QaService>,
    pub limits: Option<RouteLimits>,
}

impl AppState {
    /// State without rate limits.
    pub fn new(service: QaService) -> Self {
        Self {
            service: Arc::new(service),
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: Option<RouteLimits>) -> Self {
        self.limits = limits;
        self
    }
}

/// CORS for the configured origins: GET and POST with a `Content-Type`
/// header. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> AppResult<CorsLayer> {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim()).map_err(|e| {
                    AppError::Config(format!("Invalid CORS origin '{}': {}", origin, e))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

/// The full application: routes, CORS and request tracing.
pub fn create_router(state: AppState, cors_origins: &[String]) -> AppResult<Router> {
    Ok(routes::api_routes(state)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &AppConfig, service: QaService) -> AppResult<()> {
    let limits = RouteLimits::from_settings(&config.server.rate_limit);
    let state = AppState::new(service).with_limits(limits);
    let app = create_router(state, &config.server.cors_origins)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("CORS origins: {}", config.server.cors_origins.join(", "));
    let limits = &config.server.rate_limit;
    if limits.enabled {
        tracing::info!(
            "Rate limits per client: retrieve {}/min, query {}/min",
            limits.retrieve_per_minute,
            limits.query_per_minute
        );
    } else {
        tracing::info!("Rate limiting disabled");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
