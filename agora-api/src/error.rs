//! Error Types for the Agora API
//!
//! - `ApiError` is the structured JSON error body
//! - `ErrorCode` categorizes errors and maps them to HTTP status codes
//! - `IntoResponse` lets handlers return `ApiResult<T>` directly
//!
//! Upstream provider failures are absorbed by the catalog cache and never
//! reach this layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use agora_core::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested catalog does not exist
    CatalogNotFound,

    /// Requested route does not exist
    RouteNotFound,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Bundled fallback data failed validation
    FallbackCorrupt,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::InvalidRange | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::CatalogNotFound | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,

            ErrorCode::InternalError | ErrorCode::FallbackCorrupt => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::InvalidRange => "Value out of range",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::CatalogNotFound => "Catalog not found",
            ErrorCode::RouteNotFound => "Route not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::FallbackCorrupt => "Bundled catalog data is corrupt",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an error using the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' must be {}", field, expected),
        )
    }

    pub fn catalog_not_found(name: &str) -> Self {
        Self::new(ErrorCode::CatalogNotFound, format!("Catalog '{}' not found", name))
            .with_details(serde_json::json!({
                "available": agora_core::CatalogKind::ALL.map(|k| k.as_str()),
            }))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownCatalog { name } => ApiError::catalog_not_found(&name),
            CatalogError::MalformedFallback { catalog, reason } => {
                tracing::error!(catalog = %catalog, reason = %reason, "Fallback data is malformed");
                ApiError::from_code(ErrorCode::FallbackCorrupt)
            }
            // The cache absorbs these; reaching here is a bug, not a client error.
            CatalogError::Source(e) => {
                tracing::error!(error = %e, "Source error escaped the catalog cache");
                ApiError::internal_error("Catalog refresh failed")
            }
            CatalogError::Normalization(e) => {
                tracing::error!(error = %e, "Normalization error escaped the catalog cache");
                ApiError::internal_error("Catalog refresh failed")
            }
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::CatalogKind;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidRange.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::CatalogNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::FallbackCorrupt.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::RouteNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_only_use_served_statuses() {
        let codes = [
            ErrorCode::InvalidInput,
            ErrorCode::InvalidRange,
            ErrorCode::InvalidFormat,
            ErrorCode::CatalogNotFound,
            ErrorCode::RouteNotFound,
            ErrorCode::InternalError,
            ErrorCode::FallbackCorrupt,
        ];
        for code in codes {
            // Exhaustive so a new variant must be listed above.
            match code {
                ErrorCode::InvalidInput
                | ErrorCode::InvalidRange
                | ErrorCode::InvalidFormat
                | ErrorCode::CatalogNotFound
                | ErrorCode::RouteNotFound
                | ErrorCode::InternalError
                | ErrorCode::FallbackCorrupt => {}
            }
            assert!(
                [
                    StatusCode::BAD_REQUEST,
                    StatusCode::NOT_FOUND,
                    StatusCode::INTERNAL_SERVER_ERROR
                ]
                .contains(&code.status_code()),
                "{} maps to {}",
                code,
                code.status_code()
            );
        }
    }

    #[test]
    fn test_unknown_catalog_maps_to_404_with_choices() {
        let err: ApiError = CatalogError::UnknownCatalog {
            name: "widgets".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.message.contains("widgets"));
        assert_eq!(
            err.details,
            Some(serde_json::json!({"available": ["datasets", "repositories", "models"]}))
        );
    }

    #[test]
    fn test_malformed_fallback_maps_to_500() {
        let err: ApiError = CatalogError::MalformedFallback {
            catalog: CatalogKind::Models,
            reason: "empty".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::FallbackCorrupt);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::invalid_range("limit", 1, 500);
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("INVALID_RANGE"));
        assert!(json.contains("limit"));
        assert!(!json.contains("details"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let display = ApiError::internal_error("boom").to_string();
        assert!(display.contains("InternalError"));
        assert!(display.contains("boom"));
    }
}
