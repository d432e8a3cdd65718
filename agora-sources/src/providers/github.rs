//! GitHub repository search, sorted by stars.

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Auth, HttpClient, ListingRequest};
use crate::normalize::{classify, decode, identity, or_unknown, parse_timestamp, require};
use crate::providers::{endpoint, listing};

pub const LABEL: &str = "github-search";

const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: Option<String>,
    name: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    stargazers_count: Option<u64>,
    language: Option<String>,
    topics: Option<Vec<String>>,
    pushed_at: Option<String>,
    updated_at: Option<String>,
    license: Option<License>,
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct License {
    spdx_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: Option<String>,
}

pub fn normalize(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: Repository = decode(LABEL, record)?;
    let full_name = require(LABEL, "full_name", raw.full_name)?;
    let topics = raw.topics.unwrap_or_default();

    // GitHub reports NOASSERTION when it could not detect a license.
    let license = raw.license.and_then(|l| {
        l.spdx_id
            .filter(|id| id != "NOASSERTION")
            .or(l.name)
    });

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(raw.language));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(license));
    attributes.insert(attr::AUTHOR.to_string(), or_unknown(raw.owner.and_then(|o| o.login)));

    Ok(CatalogEntry {
        id: identity(LABEL, "full_name", &full_name)?,
        name: raw.name.unwrap_or_else(|| full_name.clone()),
        description: raw.description.unwrap_or_default(),
        source_name: SourceName::Primary,
        category: classify(topics.iter().map(String::as_str)).to_string(),
        tags: topics,
        popularity: raw.stargazers_count.unwrap_or(0),
        last_updated: parse_timestamp(raw.pushed_at.or(raw.updated_at).as_deref()),
        url: raw
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{full_name}")),
        attributes,
    })
}

/// Runs a repository search query against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    client: HttpClient,
    base_url: String,
    query: String,
    token: Option<String>,
    page_size: usize,
}

impl GitHubFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            query: query.into(),
            token: None,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }

    /// Unauthenticated search works, at a much lower rate limit.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl SourceFetcher for GitHubFetcher {
    fn label(&self) -> &str {
        LABEL
    }

    fn source_name(&self) -> SourceName {
        SourceName::Primary
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let request = ListingRequest::new(LABEL, endpoint(&self.base_url, "search/repositories"))
            .with_query("q", &self.query)
            .with_query("sort", "stars")
            .with_query("order", "desc")
            .with_query("per_page", self.page_size)
            .with_accept(ACCEPT)
            .with_auth(Auth::bearer_opt(self.token.as_deref()));

        let body = self.client.get_json(request).await?;
        listing(LABEL, body, "/items", normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::UNKNOWN;
    use serde_json::json;

    #[test]
    fn test_normalize_repository() {
        let entry = normalize(json!({
            "full_name": "huggingface/transformers",
            "name": "transformers",
            "description": "State-of-the-art Machine Learning for PyTorch",
            "html_url": "https://github.com/huggingface/transformers",
            "stargazers_count": 140000,
            "language": "Python",
            "topics": ["nlp", "pytorch", "deep-learning"],
            "pushed_at": "2024-05-01T12:00:00Z",
            "license": {"spdx_id": "Apache-2.0", "name": "Apache License 2.0"},
            "owner": {"login": "huggingface"}
        }))
        .unwrap();

        assert_eq!(entry.id, "huggingface/transformers");
        assert_eq!(entry.name, "transformers");
        assert_eq!(entry.category, "nlp");
        assert_eq!(entry.popularity, 140000);
        assert_eq!(entry.attribute(attr::LANGUAGE), "Python");
        assert_eq!(entry.attribute(attr::LICENSE), "Apache-2.0");
        assert_eq!(entry.attribute(attr::AUTHOR), "huggingface");
        assert_eq!(entry.tags.len(), 3);
    }

    #[test]
    fn test_noassertion_license_uses_name() {
        let entry = normalize(json!({
            "full_name": "a/b",
            "license": {"spdx_id": "NOASSERTION", "name": "Other"},
            "language": null
        }))
        .unwrap();
        assert_eq!(entry.attribute(attr::LICENSE), "Other");
        assert_eq!(entry.attribute(attr::LANGUAGE), UNKNOWN);
        assert_eq!(entry.url, "https://github.com/a/b");
        assert_eq!(entry.name, "a/b");
    }

    #[test]
    fn test_mixed_case_full_name_is_canonicalized() {
        let entry = normalize(json!({"full_name": "OpenAI/Whisper"})).unwrap();
        assert_eq!(entry.id, "openai/whisper");
    }
}
