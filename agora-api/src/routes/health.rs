//! Health Check Endpoints
//!
//! Kubernetes-compatible probes:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Per-catalog cache state
//!
//! Readiness reads cache state only and never triggers an upstream fetch.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use agora_catalog::{CatalogRegistry, CatalogStatus, SnapshotOrigin};
use agora_core::CatalogKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDetails {
    pub catalogs: Vec<CatalogHealth>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogHealth {
    pub catalog: CatalogKind,
    pub status: HealthStatus,
    pub origin: SnapshotOrigin,
    pub entry_count: usize,
    pub stale: bool,
}

impl From<&CatalogStatus> for CatalogHealth {
    fn from(status: &CatalogStatus) -> Self {
        let health = if status.origin.is_degraded() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        Self {
            catalog: status.catalog,
            status: health,
            origin: status.origin,
            entry_count: status.entry_count,
            stale: status.stale,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Catalog readiness.
///
/// Always 200: every catalog can answer from live, retained or bundled data.
/// The body is `degraded` if any catalog is serving fallback or retained data.
pub async fn readiness(
    State(registry): State<Arc<CatalogRegistry>>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let catalogs: Vec<CatalogHealth> = registry.statuses().iter().map(CatalogHealth::from).collect();

    let status = if catalogs.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            catalogs,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };
    (StatusCode::OK, Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(origin: SnapshotOrigin) -> CatalogStatus {
        CatalogStatus {
            catalog: CatalogKind::Datasets,
            entry_count: 3,
            last_updated: None,
            last_checked: None,
            origin,
            stale_threshold_secs: 60,
            stale: false,
        }
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            message: Some("All systems operational".to_string()),
            details: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_catalog_health_from_origin() {
        assert_eq!(CatalogHealth::from(&status(SnapshotOrigin::Live)).status, HealthStatus::Healthy);
        assert_eq!(CatalogHealth::from(&status(SnapshotOrigin::Empty)).status, HealthStatus::Healthy);
        assert_eq!(
            CatalogHealth::from(&status(SnapshotOrigin::Fallback)).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            CatalogHealth::from(&status(SnapshotOrigin::Retained)).status,
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_catalog_health_serialization() {
        let json = serde_json::to_value(CatalogHealth::from(&status(SnapshotOrigin::Fallback))).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["origin"], "fallback");
        assert_eq!(json["catalog"], "datasets");
    }
}
