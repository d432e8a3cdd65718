//! Upstream provider adapters.
//!
//! Each submodule owns one provider: its raw record shape, a pure
//! `normalize` function, and a [`SourceFetcher`](agora_catalog::SourceFetcher)
//! that shapes the listing request.
//!
//! | Label | Catalog | Source | Credentials |
//! |-------|---------|--------|-------------|
//! | `huggingface-datasets` | datasets | primary | optional `HF_TOKEN` |
//! | `kaggle-datasets` | datasets | secondary | `KAGGLE_USERNAME` + `KAGGLE_KEY` |
//! | `data-gov` | datasets | public | none |
//! | `github-search` | repositories | primary | optional `GITHUB_TOKEN` |
//! | `gitlab-projects` | repositories | secondary | optional `GITLAB_TOKEN` |
//! | `huggingface-models` | models | primary | optional `HF_TOKEN` |
//! | `replicate-models` | models | secondary | `REPLICATE_API_TOKEN` |

pub mod ckan;
pub mod github;
pub mod gitlab;
pub mod huggingface;
pub mod kaggle;
pub mod replicate;

use agora_core::{CatalogEntry, SourceError};
use serde_json::Value;

use crate::normalize::{normalize_batch, records_at, NormalizeFn};

/// The empty listing returned by a provider missing its credentials.
pub(crate) fn not_configured(label: &str, missing: &str) -> Vec<CatalogEntry> {
    tracing::debug!(source = label, missing = missing, "Source not configured, skipping");
    Vec::new()
}

/// Pull the record array out of a listing body and normalize it.
pub(crate) fn listing(
    provider: &str,
    body: Value,
    pointer: &str,
    normalize: NormalizeFn,
) -> Result<Vec<CatalogEntry>, SourceError> {
    let records = records_at(body, pointer).ok_or_else(|| SourceError::InvalidResponse {
        provider: provider.to_string(),
        reason: if pointer.is_empty() {
            "expected a JSON array".to_string()
        } else {
            format!("expected a JSON array at {pointer}")
        },
    })?;
    Ok(normalize_batch(provider, records, normalize))
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
