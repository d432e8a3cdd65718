//! Agora Core - Catalog Types
//!
//! Pure data structures shared by every Agora crate. This crate contains the
//! canonical catalog entry shape, the query filter description, and the error
//! taxonomy. It performs no I/O.

pub mod catalog;
pub mod entry;
pub mod error;
pub mod filter;

use chrono::{DateTime, Utc};

// ============================================================================
// COMMON ALIASES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// The Unix epoch, used as the "never" timestamp.
///
/// Freshly constructed caches report this as their last update, which
/// guarantees the first read forces a refresh. Normalizers also substitute it
/// when an upstream record carries no modification time.
pub fn epoch() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH
}

pub use catalog::CatalogKind;
pub use entry::{attr, CatalogEntry, SourceName, UNKNOWN};
pub use error::{CatalogError, CatalogResult, NormalizationError, SourceError};
pub use filter::{FilterSpec, SortBy};
