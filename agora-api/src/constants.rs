//! Constants for the Agora API

// ============================================================================
// SERVER
// ============================================================================

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// CATALOG CACHE
// ============================================================================

/// Default per-source fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// PAGINATION
// ============================================================================

/// Default page size for catalog queries
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Maximum page size for catalog queries
pub const MAX_PAGE_SIZE: usize = 500;

// ============================================================================
// LOGGING
// ============================================================================

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "agora_api=debug,agora_catalog=info,tower_http=info,info";
