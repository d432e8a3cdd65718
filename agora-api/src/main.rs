//! Agora API Server Entry Point
//!
//! Loads configuration, validates the bundled fallback catalogs, and
//! starts the Axum HTTP server.

use std::sync::Arc;

use agora_api::telemetry::{init_tracing, TelemetryConfig};
use agora_api::{build_registry, create_api_router, ApiConfig, ApiError, ApiResult};
use agora_sources::{HttpClient, SourcesConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let sources_config = SourcesConfig::from_env();

    let client = HttpClient::new(&sources_config.user_agent).map_err(|e| {
        ApiError::internal_error(format!("Failed to build HTTP client: {}", e))
    })?;

    let registry = Arc::new(build_registry(&api_config, &sources_config, &client));
    registry.validate_fallbacks()?;

    if api_config.warm_up {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.warm_up().await });
    }

    let app = create_api_router(registry, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        environment = %telemetry_config.environment,
        "Starting Agora API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
