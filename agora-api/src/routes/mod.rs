//! REST API Routes Module
//!
//! - Catalog listing and queries under /api/v1/catalogs
//! - Health checks at /health/*
//! - Prometheus metrics at /metrics
//! - CORS for browser clients

pub mod catalog;
pub mod health;

use std::sync::Arc;
use std::time::Duration;

use agora_catalog::CatalogRegistry;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origins allow any origin (development). The API is read-only, so
/// only GET and OPTIONS are allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: Restricting origins");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}

async fn route_not_found() -> ApiError {
    ApiError::from_code(ErrorCode::RouteNotFound)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// Layer execution order: CORS -> Compression -> Observability -> Handler.
pub fn create_api_router(registry: Arc<CatalogRegistry>, config: &ApiConfig) -> Router {
    let state = AppState::new(registry);

    Router::new()
        .nest("/api/v1/catalogs", catalog::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .fallback(route_not_found)
        .with_state(state)
        .layer(from_fn(observability_middleware))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(config))
}
