//! Upstream source abstraction.

use agora_core::{CatalogEntry, SourceError, SourceName};
use async_trait::async_trait;

/// Retrieves and normalizes one upstream provider's current listing.
///
/// Implementations own provider-specific request shaping (query parameters,
/// page sizes, auth headers) and run every raw record through their
/// normalizer before returning.
///
/// # Contract
///
/// - A provider that is not configured in this deployment (for example,
///   missing credentials) returns `Ok(vec![])`, not an error.
/// - Transient failures (transport errors, timeouts, 5xx, undecodable
///   bodies) return `Err`. Fault isolation is the caller's job.
/// - `fetch` should not enforce its own overall deadline; the cache wraps
///   every call in a timeout.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Stable label used in logs, metrics and refresh reports.
    fn label(&self) -> &str;

    /// Slot this fetcher fills for its catalog.
    fn source_name(&self) -> SourceName;

    /// Fetch the current listing.
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError>;
}
