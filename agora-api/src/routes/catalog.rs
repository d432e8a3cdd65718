//! Catalog REST API Routes
//!
//! - `GET /api/v1/catalogs` lists every catalog without refreshing
//! - `GET /api/v1/catalogs/:name` queries one catalog
//! - `GET /api/v1/catalogs/:name/status` reports cache state and the last refresh

use std::sync::Arc;

use agora_catalog::{CatalogRegistry, CatalogStatus, QueryResult, RefreshReport};
use agora_core::{FilterSpec, SortBy};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Raw query string for `GET /api/v1/catalogs/:name`.
///
/// Every field is taken as text and validated by [`CatalogQueryParams::parse`]
/// so malformed values produce a structured `ApiError`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQueryParams {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    pub min_popularity: Option<String>,
    pub sort_by: Option<String>,
    pub refresh: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// A validated catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub spec: FilterSpec,
    pub refresh: bool,
    pub limit: usize,
    pub offset: usize,
}

impl CatalogQueryParams {
    pub fn parse(self) -> ApiResult<CatalogQuery> {
        let mut spec = FilterSpec::new();

        if let Some(search) = non_blank(self.search) {
            spec = spec.with_search(search);
        }
        // Category matches exactly; only an empty value means "no filter".
        if let Some(category) = self.category.filter(|c| !c.is_empty()) {
            spec = spec.with_category(category);
        }
        if let Some(tags) = self.tags {
            spec.tags = FilterSpec::parse_tags(&tags);
        }
        if let Some(raw) = non_blank(self.min_popularity) {
            let min = raw
                .parse::<u64>()
                .map_err(|_| ApiError::invalid_format("minPopularity", "a non-negative integer"))?;
            spec = spec.with_min_popularity(min);
        }
        if let Some(raw) = non_blank(self.sort_by) {
            let sort_by = raw.parse::<SortBy>().map_err(|e| {
                ApiError::invalid_input(e.to_string()).with_details(serde_json::json!({
                    "field": "sortBy",
                    "allowed": ["popularity", "recency", "name"],
                }))
            })?;
            spec = spec.with_sort(sort_by);
        }

        let refresh = match non_blank(self.refresh) {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ApiError::invalid_format("refresh", "a boolean"))?,
        };

        let limit = match non_blank(self.limit) {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or_else(|| ApiError::invalid_range("limit", 1, MAX_PAGE_SIZE))?,
        };

        let offset = match non_blank(self.offset) {
            None => 0,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_format("offset", "a non-negative integer"))?,
        };

        Ok(CatalogQuery {
            spec,
            refresh,
            limit,
            offset,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Response for `GET /api/v1/catalogs/:name`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    pub limit: usize,
    pub offset: usize,
}

/// Response for `GET /api/v1/catalogs`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListResponse {
    pub catalogs: Vec<CatalogStatus>,
}

/// Response for `GET /api/v1/catalogs/:name/status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatusResponse {
    pub status: CatalogStatus,
    pub sources: Vec<String>,
    pub last_refresh: Option<RefreshReport>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/catalogs - Summaries of every catalog. Never refreshes.
pub async fn list_catalogs(
    State(registry): State<Arc<CatalogRegistry>>,
) -> Json<CatalogListResponse> {
    Json(CatalogListResponse {
        catalogs: registry.statuses(),
    })
}

/// GET /api/v1/catalogs/:name - Filtered, sorted, paginated catalog entries.
pub async fn query_catalog(
    State(registry): State<Arc<CatalogRegistry>>,
    Path(name): Path<String>,
    Query(params): Query<CatalogQueryParams>,
) -> ApiResult<Json<CatalogResponse>> {
    let query = params.parse()?;
    let result = registry
        .query(&name, &query.spec, query.refresh)
        .await?
        .paginate(query.offset, query.limit);

    tracing::debug!(
        catalog = %result.catalog,
        total = result.total,
        returned = result.entries.len(),
        origin = result.origin.as_str(),
        refresh = query.refresh,
        "Catalog query served"
    );

    Ok(Json(CatalogResponse {
        result,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// GET /api/v1/catalogs/:name/status - Cache state and the last refresh report.
pub async fn catalog_status(
    State(registry): State<Arc<CatalogRegistry>>,
    Path(name): Path<String>,
) -> ApiResult<Json<CatalogStatusResponse>> {
    let cache = registry.resolve(&name)?;
    Ok(Json(CatalogStatusResponse {
        status: cache.status(),
        sources: cache.source_labels(),
        last_refresh: cache.last_report().map(|report| RefreshReport::clone(&report)),
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalogs))
        .route("/:name", get(query_catalog))
        .route("/:name/status", get(catalog_status))
}
