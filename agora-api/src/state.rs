//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use agora_catalog::CatalogRegistry;

/// Application-wide state shared across all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every catalog cache. Built once at startup.
    pub registry: Arc<CatalogRegistry>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        Self {
            registry,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref! {
    registry: Arc<CatalogRegistry>,
    start_time: Instant,
}
