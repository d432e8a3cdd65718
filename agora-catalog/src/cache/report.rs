//! Refresh cycle diagnostics.

use std::time::Duration;

use agora_core::{CatalogKind, SourceError, SourceName, Timestamp};
use serde::Serialize;

/// What one fetcher contributed to a refresh cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOutcome {
    pub label: String,
    pub source_name: SourceName,
    /// Entries returned, after normalization and before deduplication.
    pub entries: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SourceError>,
    #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// How a refresh cycle changed the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshOutcome {
    /// Merged live data replaced the cache.
    Replaced,
    /// Nothing live and nothing cached: the fallback set was loaded.
    Fallback,
    /// Nothing live: the previous entries were kept.
    Retained,
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Replaced => "replaced",
            RefreshOutcome::Fallback => "fallback",
            RefreshOutcome::Retained => "retained",
        }
    }
}

/// Summary of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub catalog: CatalogKind,
    pub completed_at: Timestamp,
    /// One outcome per fetcher, in invocation order.
    pub sources: Vec<SourceOutcome>,
    /// Entries after deduplication (and capping, if configured).
    pub merged: usize,
    pub outcome: RefreshOutcome,
}

impl RefreshReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| !s.succeeded())
    }

    /// True if there was at least one fetcher and none of them succeeded.
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.succeeded())
    }
}

/// Receives a report after every refresh cycle.
///
/// Listeners run synchronously on the refreshing task and must not block.
pub trait RefreshListener: Send + Sync {
    fn on_refresh(&self, report: &RefreshReport);
}

impl<F> RefreshListener for F
where
    F: Fn(&RefreshReport) + Send + Sync,
{
    fn on_refresh(&self, report: &RefreshReport) {
        self(report)
    }
}

fn serialize_error<S>(error: &Option<SourceError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_millis<S>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: &str, error: Option<SourceError>) -> SourceOutcome {
        SourceOutcome {
            label: label.to_string(),
            source_name: SourceName::Primary,
            entries: if error.is_some() { 0 } else { 3 },
            error,
            elapsed: Duration::from_millis(12),
        }
    }

    fn report(sources: Vec<SourceOutcome>) -> RefreshReport {
        RefreshReport {
            catalog: CatalogKind::Repositories,
            completed_at: agora_core::epoch(),
            sources,
            merged: 3,
            outcome: RefreshOutcome::Replaced,
        }
    }

    #[test]
    fn test_all_failed() {
        let err = SourceError::Timeout {
            provider: "a".to_string(),
            after_ms: 5,
        };
        assert!(report(vec![outcome("a", Some(err.clone()))]).all_failed());
        assert!(!report(vec![outcome("a", Some(err)), outcome("b", None)]).all_failed());
        assert!(!report(Vec::new()).all_failed());
    }

    #[test]
    fn test_report_serializes_error_text() -> Result<(), serde_json::Error> {
        let err = SourceError::RateLimited {
            provider: "github-search".to_string(),
            retry_after_secs: 60,
        };
        let json = serde_json::to_value(report(vec![outcome("github-search", Some(err))]))?;
        assert_eq!(json["outcome"], "replaced");
        assert_eq!(json["sources"][0]["elapsedMs"], 12);
        assert!(json["sources"][0]["error"]
            .as_str()
            .is_some_and(|e| e.contains("Rate limited")));
        Ok(())
    }

    #[test]
    fn test_closure_listener() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let listener = move |r: &RefreshReport| {
            counter.fetch_add(r.merged, Ordering::SeqCst);
        };
        listener.on_refresh(&report(Vec::new()));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
