//! API Configuration Module
//!
//! Server, CORS, and cache settings loaded from environment variables with
//! development-friendly defaults. Provider credentials live in
//! [`agora_sources::SourcesConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use agora_catalog::CacheConfig;
use agora_core::CatalogKind;

use crate::constants::{DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_PORT};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    // ========================================================================
    // Server
    // ========================================================================
    pub bind_host: String,
    /// Raw port value, validated by [`ApiConfig::bind_addr`].
    pub port: String,

    // ========================================================================
    // CORS
    // ========================================================================
    /// Allowed origins. Empty means allow all (dev mode).
    pub cors_origins: Vec<String>,
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Catalog cache
    // ========================================================================
    pub stale_datasets: Option<Duration>,
    pub stale_repositories: Option<Duration>,
    pub stale_models: Option<Duration>,
    pub fetch_timeout: Duration,
    /// Cap on merged entries per catalog. Unbounded when `None`.
    pub max_entries: Option<usize>,
    /// Load every catalog in the background at startup.
    pub warm_up: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT.to_string(),
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            stale_datasets: None,
            stale_repositories: None,
            stale_models: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_entries: None,
            warm_up: true,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AGORA_API_BIND`: bind host (default: 0.0.0.0)
    /// - `PORT` / `AGORA_API_PORT`: port (default: 3000)
    /// - `AGORA_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `AGORA_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `AGORA_DATASETS_STALE_SECS`, `AGORA_REPOSITORIES_STALE_SECS`,
    ///   `AGORA_MODELS_STALE_SECS`: staleness threshold overrides
    /// - `AGORA_FETCH_TIMEOUT_SECS`: per-source timeout (default: 10)
    /// - `AGORA_MAX_ENTRIES`: merged entry cap (default: unbounded)
    /// - `AGORA_WARM_UP`: "false" disables startup warm-up
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str| var(key).and_then(|s| s.parse::<u64>().ok());
        let defaults = Self::default();

        let cors_origins = var("AGORA_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_host: var("AGORA_API_BIND").unwrap_or(defaults.bind_host),
            port: var("PORT")
                .or_else(|| var("AGORA_API_PORT"))
                .unwrap_or(defaults.port),
            cors_origins,
            cors_max_age_secs: secs("AGORA_CORS_MAX_AGE_SECS").unwrap_or(defaults.cors_max_age_secs),
            stale_datasets: secs("AGORA_DATASETS_STALE_SECS").map(Duration::from_secs),
            stale_repositories: secs("AGORA_REPOSITORIES_STALE_SECS").map(Duration::from_secs),
            stale_models: secs("AGORA_MODELS_STALE_SECS").map(Duration::from_secs),
            fetch_timeout: secs("AGORA_FETCH_TIMEOUT_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            max_entries: var("AGORA_MAX_ENTRIES")
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0),
            warm_up: var("AGORA_WARM_UP")
                .map(|s| s.to_lowercase() != "false" && s != "0")
                .unwrap_or(true),
        }
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let port = self
            .port
            .parse::<u16>()
            .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", self.port)))?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Cache settings for one catalog.
    pub fn cache_config(&self, kind: CatalogKind) -> CacheConfig {
        let override_threshold = match kind {
            CatalogKind::Datasets => self.stale_datasets,
            CatalogKind::Repositories => self.stale_repositories,
            CatalogKind::Models => self.stale_models,
        };
        let config = CacheConfig::for_catalog(kind)
            .with_fetch_timeout(self.fetch_timeout)
            .with_max_entries(self.max_entries);
        match override_threshold {
            Some(threshold) => config.with_stale_threshold(threshold),
            None => config,
        }
    }

    /// Whether CORS is restricted to configured origins.
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}
