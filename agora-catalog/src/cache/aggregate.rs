//! The per-catalog aggregate cache.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use agora_core::{CatalogEntry, CatalogKind, CatalogResult, SourceError, Timestamp};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::report::{RefreshListener, RefreshOutcome, RefreshReport, SourceOutcome};
use super::staleness::{is_stale, CatalogRead, SnapshotOrigin};
use crate::clock::{Clock, SystemClock};
use crate::dedup::deduplicate;
use crate::fallback::FallbackSet;
use crate::fetcher::SourceFetcher;

/// Default per-source fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for one aggregate cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which the next read triggers a refresh.
    pub stale_threshold: Duration,
    /// Upper bound on a single fetcher call.
    pub fetch_timeout: Duration,
    /// Keep only the N most popular merged entries. Unbounded when `None`.
    pub max_entries: Option<usize>,
}

impl CacheConfig {
    /// Defaults for a catalog: its standard threshold, a 10s fetch timeout,
    /// and no entry cap.
    pub fn for_catalog(kind: CatalogKind) -> Self {
        Self {
            stale_threshold: kind.default_stale_threshold(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_entries: None,
        }
    }

    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }
}

/// Point-in-time description of a cache, for listings and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub catalog: CatalogKind,
    pub entry_count: usize,
    /// `None` until the first successful load.
    pub last_updated: Option<Timestamp>,
    pub last_checked: Option<Timestamp>,
    pub origin: SnapshotOrigin,
    pub stale_threshold_secs: u64,
    /// Whether the next non-forced read would refresh.
    pub stale: bool,
}

/// Immutable cache contents. Replaced wholesale on every refresh.
#[derive(Debug)]
struct CacheSnapshot {
    entries: Arc<[CatalogEntry]>,
    /// When the served data was obtained.
    last_updated: Timestamp,
    /// When a refresh was last attempted, whatever its outcome.
    checked_at: Option<Timestamp>,
    origin: SnapshotOrigin,
    generation: u64,
}

impl CacheSnapshot {
    fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            last_updated: agora_core::epoch(),
            checked_at: None,
            origin: SnapshotOrigin::Empty,
            generation: 0,
        }
    }
}

/// A staleness-aware cache over several upstream sources.
///
/// Reads are cheap snapshot clones. At most one refresh runs at a time per
/// cache; concurrent readers that find the cache stale wait for the
/// in-flight refresh and then return its result.
pub struct AggregateCache {
    kind: CatalogKind,
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    fallback: FallbackSet,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    listeners: Vec<Arc<dyn RefreshListener>>,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    last_report: RwLock<Option<Arc<RefreshReport>>>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for AggregateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.fetchers.iter().map(|s| s.label()).collect();
        f.debug_struct("AggregateCache")
            .field("kind", &self.kind)
            .field("fetchers", &labels)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl AggregateCache {
    /// Create an empty cache. Fetchers are invoked in the given order and
    /// their entries merged in that order.
    pub fn new(
        kind: CatalogKind,
        fetchers: Vec<Arc<dyn SourceFetcher>>,
        fallback: FallbackSet,
        config: CacheConfig,
    ) -> Self {
        Self {
            kind,
            fetchers,
            fallback,
            config,
            clock: Arc::new(SystemClock),
            listeners: Vec::new(),
            snapshot: RwLock::new(Arc::new(CacheSnapshot::empty())),
            last_report: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RefreshListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn fallback(&self) -> &FallbackSet {
        &self.fallback
    }

    /// Labels of the configured fetchers, in invocation order.
    pub fn source_labels(&self) -> Vec<String> {
        self.fetchers.iter().map(|f| f.label().to_string()).collect()
    }

    /// Read the catalog, refreshing first if forced, empty or stale.
    ///
    /// Upstream failures never surface here. The only error is a malformed
    /// fallback set encountered on a cold start with every source empty.
    pub async fn get(&self, force: bool) -> CatalogResult<CatalogRead> {
        let seen = self.current();
        if !self.needs_refresh(&seen, self.clock.now(), force) {
            return Ok(self.read_of(&seen, false));
        }

        let _gate = self.refresh_gate.lock().await;

        // A refresh may have completed while this caller was waiting.
        let current = self.current();
        if current.generation != seen.generation {
            return Ok(self.read_of(&current, false));
        }

        let next = self.refresh_locked(&current).await?;
        Ok(self.read_of(&next, true))
    }

    pub fn status(&self) -> CatalogStatus {
        let snap = self.current();
        let loaded = snap.origin != SnapshotOrigin::Empty;
        CatalogStatus {
            catalog: self.kind,
            entry_count: snap.entries.len(),
            last_updated: loaded.then_some(snap.last_updated),
            last_checked: snap.checked_at,
            origin: snap.origin,
            stale_threshold_secs: self.config.stale_threshold.as_secs(),
            stale: self.needs_refresh(&snap, self.clock.now(), false),
        }
    }

    /// Report from the most recent refresh cycle, if any has run.
    pub fn last_report(&self) -> Option<Arc<RefreshReport>> {
        self.last_report
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn needs_refresh(&self, snap: &CacheSnapshot, now: Timestamp, force: bool) -> bool {
        if force || snap.entries.is_empty() {
            return true;
        }
        match snap.checked_at {
            Some(checked) => is_stale(now, checked, self.config.stale_threshold),
            None => true,
        }
    }

    fn read_of(&self, snap: &CacheSnapshot, refreshed: bool) -> CatalogRead {
        CatalogRead::new(
            self.kind,
            Arc::clone(&snap.entries),
            snap.last_updated,
            snap.origin,
            self.clock.now(),
            refreshed,
        )
    }

    /// Run one refresh cycle. Caller must hold `refresh_gate`.
    async fn refresh_locked(&self, current: &CacheSnapshot) -> CatalogResult<Arc<CacheSnapshot>> {
        let started = Instant::now();
        let results = join_all(self.fetchers.iter().map(|f| self.fetch_one(f.as_ref()))).await;

        let mut sources = Vec::with_capacity(results.len());
        let mut collected = Vec::new();
        for (outcome, entries) in results {
            sources.push(outcome);
            collected.extend(entries);
        }

        let merged = self.apply_cap(deduplicate(collected));
        let now = self.clock.now();
        let generation = current.generation + 1;

        let (next, outcome) = if !merged.is_empty() {
            let snap = CacheSnapshot {
                entries: Arc::from(merged),
                last_updated: now,
                checked_at: Some(now),
                origin: SnapshotOrigin::Live,
                generation,
            };
            (snap, RefreshOutcome::Replaced)
        } else if current.entries.is_empty() {
            let entries = self.fallback.load().map_err(|e| {
                tracing::error!(
                    catalog = %self.kind,
                    error = %e,
                    "All sources empty and fallback data is unusable"
                );
                e
            })?;
            tracing::warn!(
                catalog = %self.kind,
                entries = entries.len(),
                "All sources empty on cold start; serving fallback set"
            );
            let snap = CacheSnapshot {
                entries,
                last_updated: now,
                checked_at: Some(now),
                origin: SnapshotOrigin::Fallback,
                generation,
            };
            (snap, RefreshOutcome::Fallback)
        } else {
            tracing::warn!(
                catalog = %self.kind,
                entries = current.entries.len(),
                last_updated = %current.last_updated,
                "All sources empty; retaining previous entries"
            );
            let origin = match current.origin {
                SnapshotOrigin::Fallback => SnapshotOrigin::Fallback,
                _ => SnapshotOrigin::Retained,
            };
            let snap = CacheSnapshot {
                entries: Arc::clone(&current.entries),
                last_updated: current.last_updated,
                checked_at: Some(now),
                origin,
                generation,
            };
            (snap, RefreshOutcome::Retained)
        };

        let report = RefreshReport {
            catalog: self.kind,
            completed_at: now,
            sources,
            merged: next.entries.len(),
            outcome,
        };

        if report.all_failed() {
            tracing::error!(
                catalog = %self.kind,
                sources = report.sources.len(),
                "Every source failed during refresh"
            );
        }
        tracing::info!(
            catalog = %self.kind,
            entries = report.merged,
            outcome = outcome.as_str(),
            failed = report.failed_sources().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Catalog refresh complete"
        );

        let next = Arc::new(next);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        for listener in &self.listeners {
            listener.on_refresh(&report);
        }
        *self.last_report.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(report));

        Ok(next)
    }

    /// Invoke one fetcher under the configured timeout. A failure yields an
    /// empty contribution.
    async fn fetch_one(&self, fetcher: &dyn SourceFetcher) -> (SourceOutcome, Vec<CatalogEntry>) {
        let started = Instant::now();
        let timeout = self.config.fetch_timeout;

        let result = match tokio::time::timeout(timeout, fetcher.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                provider: fetcher.label().to_string(),
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        let elapsed = started.elapsed();

        let (error, entries) = match result {
            Ok(entries) => {
                tracing::debug!(
                    catalog = %self.kind,
                    source = fetcher.label(),
                    entries = entries.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Source fetched"
                );
                (None, entries)
            }
            Err(e) => {
                tracing::warn!(
                    catalog = %self.kind,
                    source = fetcher.label(),
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Source unavailable; contributing no entries"
                );
                (Some(e), Vec::new())
            }
        };

        let outcome = SourceOutcome {
            label: fetcher.label().to_string(),
            source_name: fetcher.source_name(),
            entries: entries.len(),
            error,
            elapsed,
        };
        (outcome, entries)
    }

    /// Keep the `max_entries` most popular entries, preserving merge order.
    fn apply_cap(&self, merged: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
        let Some(max) = self.config.max_entries else {
            return merged;
        };
        if merged.len() <= max {
            return merged;
        }

        let mut ranked: Vec<usize> = (0..merged.len()).collect();
        ranked.sort_by(|a, b| merged[*b].popularity.cmp(&merged[*a].popularity));
        let mut keep = vec![false; merged.len()];
        for idx in ranked.into_iter().take(max) {
            keep[idx] = true;
        }

        merged
            .into_iter()
            .zip(keep)
            .filter_map(|(entry, kept)| kept.then_some(entry))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
