//! Agora Test Utilities
//!
//! Shared test infrastructure for the Agora workspace:
//! - Scriptable mock fetchers
//! - Proptest generators for entries and filter specs
//! - Entry builders and canned catalogs
//! - Assertions over entry lists

pub use agora_catalog::{
    AggregateCache, CacheConfig, CatalogRegistry, FallbackSet, ManualClock, SourceFetcher,
};
pub use agora_core::{
    CatalogEntry, CatalogError, CatalogKind, FilterSpec, SortBy, SourceError, SourceName,
    Timestamp,
};

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// MOCK FETCHERS
// ============================================================================

type Scripted = Result<Vec<CatalogEntry>, SourceError>;

/// A fetcher whose responses are scripted by the test.
///
/// Responses queued with [`MockFetcher::then`] are consumed one per call;
/// once the queue is empty every call returns the standing response.
#[derive(Debug)]
pub struct MockFetcher {
    label: String,
    source_name: SourceName,
    standing: Mutex<Scripted>,
    queue: Mutex<VecDeque<Scripted>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// A fetcher that returns no entries.
    pub fn new(label: impl Into<String>, source_name: SourceName) -> Self {
        Self {
            label: label.into(),
            source_name,
            standing: Mutex::new(Ok(Vec::new())),
            queue: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return `entries`.
    pub fn returning(mut self, entries: Vec<CatalogEntry>) -> Self {
        self.standing = Mutex::new(Ok(entries));
        self
    }

    /// Always fail with a 503.
    pub fn failing(self) -> Self {
        let error = SourceError::RequestFailed {
            provider: self.label.clone(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        self.failing_with(error)
    }

    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.standing = Mutex::new(Err(error));
        self
    }

    /// Sleep before answering. Pair with a paused tokio clock.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a one-shot response ahead of the standing one.
    pub fn then(self, response: Scripted) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Replace the standing response.
    pub fn set_response(&self, response: Scripted) {
        *self.standing.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn label(&self) -> &str {
        &self.label
    }

    fn source_name(&self) -> SourceName {
        self.source_name
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match queued {
            Some(response) => response,
            None => self
                .standing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Erase a list of mock fetchers for [`AggregateCache::new`].
pub fn as_fetchers(mocks: &[Arc<MockFetcher>]) -> Vec<Arc<dyn SourceFetcher>> {
    mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn SourceFetcher>)
        .collect()
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog types.

    use super::*;
    use proptest::prelude::*;

    /// Timestamps between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(agora_core::epoch)
        })
    }

    pub fn arb_source_name() -> impl Strategy<Value = SourceName> {
        prop_oneof![
            Just(SourceName::Primary),
            Just(SourceName::Secondary),
            Just(SourceName::Public),
        ]
    }

    pub fn arb_sort_by() -> impl Strategy<Value = SortBy> {
        prop_oneof![
            Just(SortBy::Popularity),
            Just(SortBy::Recency),
            Just(SortBy::Name),
        ]
    }

    /// Small category vocabulary so filters actually hit.
    pub fn arb_category() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["nlp", "vision", "audio", "tabular"]).prop_map(String::from)
    }

    pub fn arb_tag() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["pytorch", "english", "cnn", "llm", "csv"]).prop_map(String::from)
    }

    /// An entry whose id is drawn from a small pool, so collisions occur.
    pub fn arb_entry() -> impl Strategy<Value = CatalogEntry> {
        (
            0u8..16,
            "[A-Za-z][A-Za-z0-9 ]{0,11}",
            arb_source_name(),
            prop::collection::vec(arb_tag(), 0..4),
            arb_category(),
            0u64..10_000,
            arb_timestamp(),
        )
            .prop_map(|(id, name, source_name, tags, category, popularity, updated)| {
                EntryBuilder::new(format!("owner/item-{id}"))
                    .name(name)
                    .source(source_name)
                    .tags(tags)
                    .category(category)
                    .popularity(popularity)
                    .updated_at(updated)
                    .build()
            })
    }

    pub fn arb_entries(max: usize) -> impl Strategy<Value = Vec<CatalogEntry>> {
        prop::collection::vec(arb_entry(), 0..max)
    }

    pub fn arb_filter_spec() -> impl Strategy<Value = FilterSpec> {
        (
            prop::option::of("[a-z]{0,3}"),
            prop::option::of(arb_category()),
            prop::collection::vec(arb_tag(), 0..2),
            prop::option::of(0u64..10_000),
            arb_sort_by(),
        )
            .prop_map(|(search_term, category, tags, min_popularity, sort_by)| FilterSpec {
                search_term,
                category,
                tags,
                min_popularity,
                sort_by,
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built entries and caches.

    use super::*;

    /// `n` distinct entries with ids `{prefix}/entry-{i}`.
    pub fn entries(prefix: &str, n: usize, source: SourceName) -> Vec<CatalogEntry> {
        (0..n)
            .map(|i| {
                EntryBuilder::new(format!("{prefix}/entry-{i}"))
                    .source(source)
                    .popularity(i as u64)
                    .build()
            })
            .collect()
    }

    /// A cache over the given mocks with the bundled fallback and a manual clock.
    pub fn cache(
        kind: CatalogKind,
        mocks: &[Arc<MockFetcher>],
        clock: Arc<ManualClock>,
    ) -> AggregateCache {
        AggregateCache::new(
            kind,
            as_fetchers(mocks),
            FallbackSet::bundled(kind),
            CacheConfig::for_catalog(kind),
        )
        .with_clock(clock)
    }
}

// ============================================================================
// ENTRY BUILDER
// ============================================================================

/// Fluent constructor for [`CatalogEntry`] with sensible defaults.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    entry: CatalogEntry,
}

impl EntryBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            entry: CatalogEntry {
                name: id.clone(),
                description: String::new(),
                source_name: SourceName::Primary,
                tags: Vec::new(),
                category: "general".to_string(),
                popularity: 0,
                last_updated: agora_core::epoch(),
                url: format!("https://example.org/{id}"),
                attributes: BTreeMap::new(),
                id,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.entry.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = description.into();
        self
    }

    pub fn source(mut self, source_name: SourceName) -> Self {
        self.entry.source_name = source_name;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.entry.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.entry.tags = tags;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.entry.category = category.into();
        self
    }

    pub fn popularity(mut self, popularity: u64) -> Self {
        self.entry.popularity = popularity;
        self
    }

    pub fn updated_at(mut self, at: Timestamp) -> Self {
        self.entry.last_updated = at;
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entry.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> CatalogEntry {
        self.entry
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over entry lists.

    use super::*;
    use std::collections::HashSet;

    /// Assert the entry ids, in order.
    #[track_caller]
    pub fn assert_ids(entries: &[CatalogEntry], expected: &[&str]) {
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, expected, "entry ids differ");
    }

    /// Assert no id appears twice.
    #[track_caller]
    pub fn assert_unique_ids(entries: &[CatalogEntry]) {
        let mut seen = HashSet::new();
        for e in entries {
            assert!(seen.insert(e.id.as_str()), "duplicate id {}", e.id);
        }
    }

    /// Assert every entry came from the bundled fallback set.
    #[track_caller]
    pub fn assert_all_fallback(entries: &[CatalogEntry]) {
        assert!(!entries.is_empty(), "expected fallback entries, got none");
        for e in entries {
            assert_eq!(e.source_name, SourceName::Fallback, "entry {} is live", e.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_consumes_queue_then_standing() {
        let mock = MockFetcher::new("m", SourceName::Primary)
            .returning(fixtures::entries("a", 2, SourceName::Primary))
            .then(Err(SourceError::Timeout {
                provider: "m".to_string(),
                after_ms: 1,
            }));

        assert!(mock.fetch().await.is_err());
        assert_eq!(mock.fetch().await.map(|e| e.len()), Ok(2));
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_entry_builder_defaults() {
        let e = EntryBuilder::new("x/y").popularity(3).tag("nlp").build();
        assert_eq!(e.name, "x/y");
        assert_eq!(e.popularity, 3);
        assert!(e.has_tag("nlp"));
        assert_eq!(e.url, "https://example.org/x/y");
    }
}
