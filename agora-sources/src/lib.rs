//! Agora Sources - Upstream Provider Adapters
//!
//! Concrete [`SourceFetcher`](agora_catalog::SourceFetcher) implementations
//! for every upstream provider, the pure normalizers that map provider
//! records onto [`CatalogEntry`](agora_core::CatalogEntry), and the shared
//! HTTP client and configuration they use.

pub mod catalogs;
pub mod client;
pub mod config;
pub mod normalize;
pub mod providers;

pub use catalogs::fetchers_for;
pub use client::{Auth, HttpClient, ListingRequest};
pub use config::{Endpoints, KaggleCredentials, SourcesConfig};
pub use normalize::{canonical_id, classify, NormalizeFn};

use agora_core::CatalogKind;

/// Every provider normalizer with its label, for tooling that exercises
/// them without network access.
pub fn normalizers() -> [(&'static str, NormalizeFn); 7] {
    use providers::*;
    [
        (huggingface::DATASETS_LABEL, huggingface::normalize_dataset),
        (kaggle::LABEL, kaggle::normalize),
        (ckan::LABEL, ckan::normalize),
        (github::LABEL, github::normalize),
        (gitlab::LABEL, gitlab::normalize),
        (huggingface::MODELS_LABEL, huggingface::normalize_model),
        (replicate::LABEL, replicate::normalize),
    ]
}

/// The catalog a provider label feeds.
pub fn catalog_of(label: &str) -> Option<CatalogKind> {
    use providers::*;
    match label {
        huggingface::DATASETS_LABEL | kaggle::LABEL | ckan::LABEL => Some(CatalogKind::Datasets),
        github::LABEL | gitlab::LABEL => Some(CatalogKind::Repositories),
        huggingface::MODELS_LABEL | replicate::LABEL => Some(CatalogKind::Models),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_normalizer_has_a_catalog() {
        for (label, _) in normalizers() {
            assert!(catalog_of(label).is_some(), "{label} has no catalog");
        }
        assert_eq!(catalog_of("myspace"), None);
    }

    #[test]
    fn test_normalizers_reject_non_objects() {
        for (label, normalize) in normalizers() {
            assert!(normalize(serde_json::json!(42)).is_err(), "{label} accepted a number");
        }
    }
}
