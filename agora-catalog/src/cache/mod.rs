//! Aggregate cache with explicit staleness and failure policy.
//!
//! Reads return a [`CatalogRead`] that carries the data's age and origin, so
//! callers can show "data as of ..." without knowing how the list was built.
//!
//! # Refresh policy
//!
//! A read refreshes when it is forced, when the cache holds no entries, or
//! when the last refresh attempt is older than the catalog's threshold. A
//! refresh calls every fetcher concurrently and then:
//!
//! | merged result | previous cache | action                          |
//! |---------------|----------------|---------------------------------|
//! | non-empty     | any            | replace, stamp `last_updated`   |
//! | empty         | empty          | load fallback set, stamp        |
//! | empty         | non-empty      | retain previous data            |

pub mod aggregate;
pub mod report;
pub mod staleness;

pub use aggregate::{AggregateCache, CacheConfig, CatalogStatus};
pub use report::{RefreshListener, RefreshOutcome, RefreshReport, SourceOutcome};
pub use staleness::{is_stale, CatalogRead, SnapshotOrigin};
