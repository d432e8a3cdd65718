//! Name-addressed access to every catalog's cache.
//!
//! The registry is built once at startup and passed to request handlers;
//! there is no module-level singleton.

use std::collections::BTreeMap;
use std::sync::Arc;

use agora_core::{CatalogEntry, CatalogError, CatalogKind, CatalogResult, FilterSpec, Timestamp};
use futures_util::future::join_all;
use serde::Serialize;

use crate::cache::{AggregateCache, CatalogRead, CatalogStatus, SnapshotOrigin};
use crate::query;

/// Filtered, sorted view of a catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub catalog: CatalogKind,
    pub entries: Vec<CatalogEntry>,
    /// Matching entries before pagination.
    pub total: usize,
    pub last_updated: Timestamp,
    pub origin: SnapshotOrigin,
}

impl QueryResult {
    fn from_read(read: &CatalogRead, spec: &FilterSpec) -> Self {
        let entries = query::apply(read.entries(), spec);
        Self {
            catalog: read.catalog(),
            total: entries.len(),
            entries,
            last_updated: read.last_updated(),
            origin: read.origin(),
        }
    }

    /// Keep one page of entries. `total` is unchanged.
    pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
        self.entries = self.entries.into_iter().skip(offset).take(limit).collect();
        self
    }
}

/// Every configured catalog cache, keyed by kind.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    caches: BTreeMap<CatalogKind, Arc<AggregateCache>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache under its own kind, replacing any previous one.
    pub fn with_catalog(mut self, cache: AggregateCache) -> Self {
        self.caches.insert(cache.kind(), Arc::new(cache));
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = CatalogKind> + '_ {
        self.caches.keys().copied()
    }

    pub fn cache(&self, kind: CatalogKind) -> Option<&Arc<AggregateCache>> {
        self.caches.get(&kind)
    }

    /// Look up a cache by its URL name.
    pub fn resolve(&self, name: &str) -> CatalogResult<&Arc<AggregateCache>> {
        let kind: CatalogKind = name.parse()?;
        self.caches
            .get(&kind)
            .ok_or_else(|| CatalogError::UnknownCatalog {
                name: name.to_string(),
            })
    }

    /// Read-through access to one catalog.
    pub async fn get_catalog(&self, name: &str, force_refresh: bool) -> CatalogResult<CatalogRead> {
        self.resolve(name)?.get(force_refresh).await
    }

    /// `get_catalog` followed by filter and sort.
    pub async fn query_catalog(&self, name: &str, spec: &FilterSpec) -> CatalogResult<QueryResult> {
        self.query(name, spec, false).await
    }

    /// Query, optionally forcing a refresh first.
    pub async fn query(
        &self,
        name: &str,
        spec: &FilterSpec,
        force_refresh: bool,
    ) -> CatalogResult<QueryResult> {
        let read = self.get_catalog(name, force_refresh).await?;
        Ok(QueryResult::from_read(&read, spec))
    }

    pub fn statuses(&self) -> Vec<CatalogStatus> {
        self.caches.values().map(|c| c.status()).collect()
    }

    /// Check every bundled fallback set. Intended for startup.
    pub fn validate_fallbacks(&self) -> CatalogResult<()> {
        for cache in self.caches.values() {
            let count = cache.fallback().validate()?;
            tracing::debug!(catalog = %cache.kind(), entries = count, "Fallback set valid");
        }
        Ok(())
    }

    /// Load every catalog concurrently so the first request hits a warm
    /// cache. Failures are logged, not returned.
    pub async fn warm_up(&self) {
        let reads = join_all(
            self.caches
                .values()
                .map(|c| async move { (c.kind(), c.get(false).await) }),
        )
        .await;
        for (kind, read) in reads {
            match read {
                Ok(read) => tracing::info!(
                    catalog = %kind,
                    entries = read.len(),
                    origin = read.origin().as_str(),
                    "Catalog warmed up"
                ),
                Err(e) => tracing::error!(catalog = %kind, error = %e, "Catalog warm-up failed"),
            }
        }
    }
}
