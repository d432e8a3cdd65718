//! Hugging Face Hub: datasets and models.
//!
//! Both listings come from the Hub's public API sorted by downloads. Tags of
//! the form `key:value` carry structured metadata (`license:mit`,
//! `language:en`, `task_categories:text-classification`).

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Auth, HttpClient, ListingRequest};
use crate::normalize::{
    classify, decode, identity, or_unknown, parse_timestamp, require, tag_value,
};
use crate::providers::{endpoint, listing};

pub const DATASETS_LABEL: &str = "huggingface-datasets";
pub const MODELS_LABEL: &str = "huggingface-models";

const HUB: &str = "https://huggingface.co";

#[derive(Debug, Deserialize)]
struct HubRecord {
    id: Option<String>,
    author: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    downloads: Option<u64>,
    likes: Option<u64>,
    #[serde(rename = "lastModified")]
    last_modified: Option<String>,
    pipeline_tag: Option<String>,
    library_name: Option<String>,
}

impl HubRecord {
    fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// Plain tags, without the `key:value` metadata ones.
    fn plain_tags(&self) -> Vec<String> {
        self.tags()
            .iter()
            .filter(|t| !t.contains(':'))
            .cloned()
            .collect()
    }

    fn author(&self, id: &str) -> String {
        let from_id = id.split_once('/').map(|(owner, _)| owner.to_string());
        or_unknown(self.author.clone().or(from_id))
    }

    fn popularity(&self) -> u64 {
        self.downloads.or(self.likes).unwrap_or(0)
    }
}

/// Normalize one `/api/datasets` record.
pub fn normalize_dataset(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: HubRecord = decode(DATASETS_LABEL, record)?;
    let id = require(DATASETS_LABEL, "id", raw.id.clone())?;

    let tags = raw.tags();
    let task_labels: Vec<&str> = tags
        .iter()
        .filter_map(|t| t.strip_prefix("task_categories:"))
        .collect();
    let category = if task_labels.is_empty() {
        classify(raw.plain_tags().iter().map(String::as_str))
    } else {
        classify(task_labels)
    };

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(tag_value(tags, "language").map(str::to_string)));
    attributes.insert(attr::SIZE.to_string(), or_unknown(tag_value(tags, "size_categories").map(str::to_string)));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(tag_value(tags, "license").map(str::to_string)));
    attributes.insert(attr::FORMAT.to_string(), or_unknown(tag_value(tags, "format").map(str::to_string)));
    attributes.insert(attr::AUTHOR.to_string(), raw.author(&id));

    Ok(CatalogEntry {
        id: identity(DATASETS_LABEL, "id", &id)?,
        name: display_name(&id),
        description: raw.description.clone().unwrap_or_default().trim().to_string(),
        source_name: SourceName::Primary,
        tags: raw.plain_tags(),
        category: category.to_string(),
        popularity: raw.popularity(),
        last_updated: parse_timestamp(raw.last_modified.as_deref()),
        url: format!("{HUB}/datasets/{id}"),
        attributes,
    })
}

/// Normalize one `/api/models` record.
pub fn normalize_model(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: HubRecord = decode(MODELS_LABEL, record)?;
    let id = require(MODELS_LABEL, "id", raw.id.clone())?;

    let category = match raw.pipeline_tag.as_deref() {
        Some(task) => classify([task]),
        None => classify(raw.plain_tags().iter().map(String::as_str)),
    };

    let tags = raw.tags();
    let mut attributes = BTreeMap::new();
    attributes.insert(attr::LIBRARY.to_string(), or_unknown(raw.library_name.clone()));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(tag_value(tags, "license").map(str::to_string)));
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(tag_value(tags, "language").map(str::to_string)));
    attributes.insert(attr::AUTHOR.to_string(), raw.author(&id));

    let mut plain = raw.plain_tags();
    if let Some(task) = &raw.pipeline_tag {
        if !plain.contains(task) {
            plain.push(task.clone());
        }
    }

    Ok(CatalogEntry {
        id: identity(MODELS_LABEL, "id", &id)?,
        name: display_name(&id),
        description: raw.description.clone().unwrap_or_default().trim().to_string(),
        source_name: SourceName::Primary,
        tags: plain,
        category: category.to_string(),
        popularity: raw.popularity(),
        last_updated: parse_timestamp(raw.last_modified.as_deref()),
        url: format!("{HUB}/{id}"),
        attributes,
    })
}

fn display_name(id: &str) -> String {
    id.rsplit_once('/').map_or(id, |(_, name)| name).to_string()
}

/// Which Hub listing a fetcher reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubListing {
    Datasets,
    Models,
}

/// Fetches the most downloaded datasets or models from the Hub.
#[derive(Debug, Clone)]
pub struct HuggingFaceFetcher {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
    page_size: usize,
    listing: HubListing,
}

impl HuggingFaceFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>, listing: HubListing) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            listing,
        }
    }

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
impl SourceFetcher for HuggingFaceFetcher {
    fn label(&self) -> &str {
        match self.listing {
            HubListing::Datasets => DATASETS_LABEL,
            HubListing::Models => MODELS_LABEL,
        }
    }

    fn source_name(&self) -> SourceName {
        SourceName::Primary
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let (path, normalize): (&str, crate::normalize::NormalizeFn) = match self.listing {
            HubListing::Datasets => ("api/datasets", normalize_dataset),
            HubListing::Models => ("api/models", normalize_model),
        };
        let request = ListingRequest::new(self.label(), endpoint(&self.base_url, path))
            .with_query("sort", "downloads")
            .with_query("direction", "-1")
            .with_query("limit", self.page_size)
            .with_query("full", "true")
            .with_auth(Auth::bearer_opt(self.token.as_deref()));

        let body = self.client.get_json(request).await?;
        listing(self.label(), body, "", normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::UNKNOWN;
    use serde_json::json;

    fn dataset_record() -> Value {
        json!({
            "id": "stanfordnlp/imdb",
            "author": "stanfordnlp",
            "description": "  Large Movie Review Dataset. ",
            "downloads": 120000,
            "likes": 250,
            "lastModified": "2024-01-04T16:13:37.000Z",
            "tags": [
                "task_categories:text-classification",
                "language:en",
                "license:other",
                "size_categories:10K<n<100K",
                "sentiment"
            ]
        })
    }

    #[test]
    fn test_dataset_normalization() {
        let entry = normalize_dataset(dataset_record()).unwrap();
        assert_eq!(entry.id, "stanfordnlp/imdb");
        assert_eq!(entry.name, "imdb");
        assert_eq!(entry.description, "Large Movie Review Dataset.");
        assert_eq!(entry.category, "nlp");
        assert_eq!(entry.popularity, 120000);
        assert_eq!(entry.tags, vec!["sentiment".to_string()]);
        assert_eq!(entry.attribute(attr::LANGUAGE), "en");
        assert_eq!(entry.attribute(attr::SIZE), "10K<n<100K");
        assert_eq!(entry.attribute(attr::FORMAT), UNKNOWN);
        assert_eq!(entry.url, "https://huggingface.co/datasets/stanfordnlp/imdb");
        assert_eq!(entry.last_updated.timestamp(), 1704384817);
    }

    #[test]
    fn test_dataset_missing_optionals_use_defaults() {
        let entry = normalize_dataset(json!({"id": "solo", "tags": null})).unwrap();
        assert_eq!(entry.popularity, 0);
        assert_eq!(entry.category, "general");
        assert_eq!(entry.attribute(attr::LANGUAGE), UNKNOWN);
        assert_eq!(entry.attribute(attr::AUTHOR), UNKNOWN);
        assert_eq!(entry.last_updated, agora_core::epoch());
    }

    #[test]
    fn test_model_normalization() {
        let entry = normalize_model(json!({
            "id": "openai/whisper-large-v3",
            "pipeline_tag": "automatic-speech-recognition",
            "library_name": "transformers",
            "downloads": 5000,
            "likes": 3000,
            "tags": ["pytorch", "license:apache-2.0"]
        }))
        .unwrap();
        assert_eq!(entry.category, "audio");
        assert_eq!(entry.attribute(attr::LIBRARY), "transformers");
        assert_eq!(entry.attribute(attr::LICENSE), "apache-2.0");
        assert_eq!(entry.attribute(attr::AUTHOR), "openai");
        assert!(entry.has_tag("automatic-speech-recognition"));
        assert_eq!(entry.url, "https://huggingface.co/openai/whisper-large-v3");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let err = normalize_model(json!({"downloads": 1})).unwrap_err();
        assert!(matches!(err, NormalizationError::MissingField { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = normalize_dataset(json!({"id": "a/b", "downloads": "lots"})).unwrap_err();
        assert!(matches!(err, NormalizationError::Malformed { .. }));
    }
}
