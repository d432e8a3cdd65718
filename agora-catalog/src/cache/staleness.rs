//! Staleness policy and the read wrapper returned by the cache.

use std::sync::Arc;
use std::time::Duration;

use agora_core::{CatalogEntry, CatalogKind, Timestamp};
use serde::{Deserialize, Serialize};

/// Returns true if data checked at `last` is older than `threshold` at `now`.
///
/// A `last` in the future (clock skew) is never stale.
pub fn is_stale(now: Timestamp, last: Timestamp, threshold: Duration) -> bool {
    match (now - last).to_std() {
        Ok(age) => age > threshold,
        Err(_) => false,
    }
}

/// Where the entries currently held by a cache came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    /// Nothing has been loaded yet.
    Empty,
    /// The last refresh produced live upstream data.
    Live,
    /// Every source was empty on a cold start; bundled data is served.
    Fallback,
    /// The last refresh produced nothing; older data is still served.
    Retained,
}

impl SnapshotOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotOrigin::Empty => "empty",
            SnapshotOrigin::Live => "live",
            SnapshotOrigin::Fallback => "fallback",
            SnapshotOrigin::Retained => "retained",
        }
    }

    /// True when the data is not fresh upstream output.
    pub fn is_degraded(&self) -> bool {
        matches!(self, SnapshotOrigin::Fallback | SnapshotOrigin::Retained)
    }
}

/// Result of a cache read, carrying the data's age and origin.
#[derive(Debug, Clone)]
pub struct CatalogRead {
    catalog: CatalogKind,
    entries: Arc<[CatalogEntry]>,
    last_updated: Timestamp,
    origin: SnapshotOrigin,
    read_at: Timestamp,
    refreshed: bool,
}

impl CatalogRead {
    pub(crate) fn new(
        catalog: CatalogKind,
        entries: Arc<[CatalogEntry]>,
        last_updated: Timestamp,
        origin: SnapshotOrigin,
        read_at: Timestamp,
        refreshed: bool,
    ) -> Self {
        Self {
            catalog,
            entries,
            last_updated,
            origin,
            read_at,
            refreshed,
        }
    }

    pub fn catalog(&self) -> CatalogKind {
        self.catalog
    }

    /// The merged entry list. Shared with the cache; cloning is cheap.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the served data was obtained.
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    /// Whether this read performed the refresh itself.
    pub fn was_refreshed(&self) -> bool {
        self.refreshed
    }

    /// Age of the served data at the time of the read.
    pub fn staleness(&self) -> Duration {
        (self.read_at - self.last_updated)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
