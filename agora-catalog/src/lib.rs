//! Agora Catalog - Multi-Source Aggregate Cache
//!
//! Each catalog (datasets, repositories, models) is served from an
//! [`AggregateCache`] that pulls entries from several independent upstream
//! [`SourceFetcher`]s, merges and deduplicates them, and keeps the last good
//! result in memory. Queries run through the stateless [`query`] engine over
//! the cache's current entry list.
//!
//! # Failure model
//!
//! A failing or slow upstream never fails a read. Its contribution for the
//! cycle is simply empty. If every source comes back empty the cache keeps
//! serving what it had, or, on a cold start, serves the bundled
//! [`FallbackSet`]. The only error a read can return is malformed fallback
//! data.
//!
//! # Example
//!
//! ```ignore
//! let cache = AggregateCache::new(
//!     CatalogKind::Models,
//!     vec![hf_models, replicate_models],
//!     FallbackSet::bundled(CatalogKind::Models),
//!     CacheConfig::for_catalog(CatalogKind::Models),
//! );
//!
//! let read = cache.get(false).await?;
//! let nlp = query::apply(read.entries(), &FilterSpec::new().with_category("nlp"));
//! ```

pub mod cache;
pub mod clock;
pub mod dedup;
pub mod fallback;
pub mod fetcher;
pub mod query;
pub mod registry;

pub use cache::{
    is_stale, AggregateCache, CacheConfig, CatalogRead, CatalogStatus, RefreshListener,
    RefreshOutcome, RefreshReport, SnapshotOrigin, SourceOutcome,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dedup::deduplicate;
pub use fallback::{FallbackSet, FALLBACK_VERSION};
pub use fetcher::SourceFetcher;
pub use registry::{CatalogRegistry, QueryResult};
