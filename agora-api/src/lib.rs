//! Agora API - HTTP layer for the catalog aggregation service
//!
//! Exposes the three aggregate catalogs (datasets, repositories, models)
//! over a read-only REST API with health probes and Prometheus metrics.
//! Catalog data is served by [`agora_catalog::CatalogRegistry`]; this crate
//! only wires fetchers, configuration and HTTP concerns around it.

pub mod config;
pub mod constants;
pub mod error;
pub mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use agora_catalog::{AggregateCache, CatalogRegistry, FallbackSet};
use agora_core::CatalogKind;
use agora_sources::{fetchers_for, HttpClient, SourcesConfig};

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
pub use telemetry::MetricsListener;

/// Build the registry of all three catalogs from configuration.
///
/// Each cache gets the live fetchers for its catalog, the bundled fallback
/// set and a metrics listener.
pub fn build_registry(
    api: &ApiConfig,
    sources: &SourcesConfig,
    client: &HttpClient,
) -> CatalogRegistry {
    CatalogKind::ALL
        .iter()
        .fold(CatalogRegistry::new(), |registry, &kind| {
            let fetchers = fetchers_for(kind, sources, client);
            tracing::debug!(catalog = %kind, fetchers = fetchers.len(), "Configuring catalog");
            let cache = AggregateCache::new(
                kind,
                fetchers,
                FallbackSet::bundled(kind),
                api.cache_config(kind),
            )
            .with_listener(Arc::new(MetricsListener));
            registry.with_catalog(cache)
        })
}
