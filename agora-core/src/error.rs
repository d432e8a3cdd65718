//! Error types for Agora catalog operations

use thiserror::Error;

use crate::CatalogKind;

/// A single upstream provider failed to produce a listing.
///
/// Always recovered inside the cache: the failing source contributes zero
/// entries for the current refresh cycle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_secs}s")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Fetch from {provider} timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
}

impl SourceError {
    /// Label of the source that failed.
    pub fn source_label(&self) -> &str {
        match self {
            SourceError::RequestFailed { provider, .. }
            | SourceError::RateLimited { provider, .. }
            | SourceError::InvalidResponse { provider, .. }
            | SourceError::Timeout { provider, .. } => provider,
        }
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::RequestFailed { .. } => "request_failed",
            SourceError::RateLimited { .. } => "rate_limited",
            SourceError::InvalidResponse { .. } => "invalid_response",
            SourceError::Timeout { .. } => "timeout",
        }
    }
}

/// A raw upstream record could not be mapped to a catalog entry.
///
/// Only the offending record is dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("Record from {provider} is missing required field {field}")]
    MissingField { provider: String, field: String },

    #[error("Record from {provider} has invalid {field}: {reason}")]
    InvalidValue {
        provider: String,
        field: String,
        reason: String,
    },

    #[error("Record from {provider} has unexpected structure: {reason}")]
    Malformed { provider: String, reason: String },
}

/// Master error type for catalog operations.
///
/// Upstream unavailability never surfaces through this type at query time;
/// the only runtime failure a caller of the cache can observe is
/// `MalformedFallback`, which indicates broken bundled data.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Fallback data for {catalog} is malformed: {reason}")]
    MalformedFallback { catalog: CatalogKind, reason: String },

    #[error("Unknown catalog: {name}")]
    UnknownCatalog { name: String },
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display_request_failed() {
        let err = SourceError::RequestFailed {
            provider: "github-search".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("github-search"));
        assert!(msg.contains("503"));
        assert_eq!(err.source_label(), "github-search");
        assert_eq!(err.kind(), "request_failed");
    }

    #[test]
    fn test_timeout_kind() {
        let err = SourceError::Timeout {
            provider: "kaggle-datasets".to_string(),
            after_ms: 10_000,
        };
        assert_eq!(err.kind(), "timeout");
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn test_catalog_error_from_source_error() {
        let err: CatalogError = SourceError::InvalidResponse {
            provider: "data-gov".to_string(),
            reason: "expected array".to_string(),
        }
        .into();
        assert!(matches!(err, CatalogError::Source(_)));
        assert!(err.to_string().starts_with("Source error"));
    }

    #[test]
    fn test_malformed_fallback_display() {
        let err = CatalogError::MalformedFallback {
            catalog: CatalogKind::Models,
            reason: "duplicate id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fallback data for models is malformed: duplicate id"
        );
    }
}
