//! Kaggle dataset listing (`/datasets/list`), authenticated with basic auth.

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Auth, HttpClient, ListingRequest};
use crate::config::KaggleCredentials;
use crate::normalize::{classify, decode, human_size, identity, or_unknown, parse_timestamp, require};
use crate::providers::{endpoint, listing, not_configured};

pub const LABEL: &str = "kaggle-datasets";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KaggleDataset {
    #[serde(rename = "ref")]
    reference: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    owner_name: Option<String>,
    total_bytes: Option<u64>,
    last_updated: Option<String>,
    download_count: Option<u64>,
    vote_count: Option<u64>,
    license_name: Option<String>,
    tags: Option<Vec<KaggleTag>>,
}

#[derive(Debug, Deserialize)]
struct KaggleTag {
    name: Option<String>,
}

pub fn normalize(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: KaggleDataset = decode(LABEL, record)?;
    let reference = require(LABEL, "ref", raw.reference)?;

    let tags: Vec<String> = raw
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| t.name)
        .filter(|t| !t.trim().is_empty())
        .collect();

    let owner = raw
        .owner_name
        .or_else(|| reference.split_once('/').map(|(o, _)| o.to_string()));

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::SIZE.to_string(), or_unknown(raw.total_bytes.map(human_size)));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(raw.license_name));
    attributes.insert(attr::AUTHOR.to_string(), or_unknown(owner));
    // The listing endpoint reports neither language nor file format.
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(None));
    attributes.insert(attr::FORMAT.to_string(), or_unknown(None));

    Ok(CatalogEntry {
        id: identity(LABEL, "ref", &reference)?,
        name: raw.title.unwrap_or_else(|| reference.clone()),
        description: raw.subtitle.unwrap_or_default(),
        source_name: SourceName::Secondary,
        category: classify(tags.iter().map(String::as_str)).to_string(),
        tags,
        popularity: raw.download_count.or(raw.vote_count).unwrap_or(0),
        last_updated: parse_timestamp(raw.last_updated.as_deref()),
        url: format!("https://www.kaggle.com/datasets/{reference}"),
        attributes,
    })
}

/// Fetches the most downloaded Kaggle datasets.
#[derive(Debug, Clone)]
pub struct KaggleFetcher {
    client: HttpClient,
    base_url: String,
    credentials: Option<KaggleCredentials>,
    page_size: usize,
}

impl KaggleFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials: None,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<KaggleCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl SourceFetcher for KaggleFetcher {
    fn label(&self) -> &str {
        LABEL
    }

    fn source_name(&self) -> SourceName {
        SourceName::Secondary
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let Some(credentials) = &self.credentials else {
            return Ok(not_configured(LABEL, "KAGGLE_USERNAME/KAGGLE_KEY"));
        };

        let request = ListingRequest::new(LABEL, endpoint(&self.base_url, "datasets/list"))
            .with_query("sortBy", "hottest")
            .with_query("pageSize", self.page_size)
            .with_auth(Auth::Basic {
                username: credentials.username.clone(),
                password: credentials.key.clone(),
            });

        let body = self.client.get_json(request).await?;
        listing(LABEL, body, "", normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::UNKNOWN;
    use serde_json::json;

    #[test]
    fn test_normalize_full_record() {
        let entry = normalize(json!({
            "ref": "zillow/zecon",
            "title": "Zillow Economics Data",
            "subtitle": "Turning on the lights in housing research",
            "ownerName": "Zillow",
            "totalBytes": 88080384,
            "lastUpdated": "2019-01-31T19:11:43.65Z",
            "downloadCount": 41000,
            "voteCount": 900,
            "licenseName": "Other (specified in description)",
            "tags": [{"name": "time series"}, {"name": "economics"}]
        }))
        .unwrap();

        assert_eq!(entry.id, "zillow/zecon");
        assert_eq!(entry.name, "Zillow Economics Data");
        assert_eq!(entry.source_name, SourceName::Secondary);
        assert_eq!(entry.category, "time-series");
        assert_eq!(entry.popularity, 41000);
        assert_eq!(entry.attribute(attr::SIZE), "84 MB");
        assert_eq!(entry.attribute(attr::AUTHOR), "Zillow");
        assert_eq!(entry.attribute(attr::LANGUAGE), UNKNOWN);
        assert_eq!(entry.url, "https://www.kaggle.com/datasets/zillow/zecon");
    }

    #[test]
    fn test_normalize_sparse_record() {
        let entry = normalize(json!({"ref": "someone/thing", "voteCount": 7})).unwrap();
        assert_eq!(entry.name, "someone/thing");
        assert_eq!(entry.popularity, 7);
        assert_eq!(entry.attribute(attr::SIZE), UNKNOWN);
        assert_eq!(entry.attribute(attr::AUTHOR), "someone");
        assert_eq!(entry.category, "general");
    }

    #[test]
    fn test_missing_ref_is_rejected() {
        assert!(normalize(json!({"title": "nameless"})).is_err());
    }

    #[tokio::test]
    async fn test_without_credentials_returns_empty() {
        let client = HttpClient::new("test").unwrap();
        let fetcher = KaggleFetcher::new(client, "http://127.0.0.1:9");
        assert_eq!(fetcher.fetch().await, Ok(Vec::new()));
    }
}
