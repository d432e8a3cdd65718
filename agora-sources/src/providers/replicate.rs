//! Replicate public models. Requires an API token.

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Auth, HttpClient, ListingRequest};
use crate::normalize::{classify, decode, identity, or_unknown, parse_timestamp, require};
use crate::providers::{endpoint, listing, not_configured};

pub const LABEL: &str = "replicate-models";

#[derive(Debug, Deserialize)]
struct Model {
    owner: Option<String>,
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    run_count: Option<u64>,
    license_url: Option<String>,
    latest_version: Option<Version>,
}

#[derive(Debug, Deserialize)]
struct Version {
    created_at: Option<String>,
}

pub fn normalize(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: Model = decode(LABEL, record)?;
    let owner = require(LABEL, "owner", raw.owner)?;
    let name = require(LABEL, "name", raw.name)?;
    let description = raw.description.unwrap_or_default();

    // Replicate has no task tags; classify from the name and description.
    let category = classify([name.as_str(), description.as_str()]);

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::AUTHOR.to_string(), owner.clone());
    attributes.insert(attr::LICENSE.to_string(), or_unknown(raw.license_url));
    attributes.insert(attr::LIBRARY.to_string(), "cog".to_string());

    Ok(CatalogEntry {
        id: identity(LABEL, "name", &format!("{owner}/{name}"))?,
        url: raw
            .url
            .unwrap_or_else(|| format!("https://replicate.com/{owner}/{name}")),
        name,
        description,
        source_name: SourceName::Secondary,
        tags: Vec::new(),
        category: category.to_string(),
        popularity: raw.run_count.unwrap_or(0),
        last_updated: parse_timestamp(
            raw.latest_version
                .and_then(|v| v.created_at)
                .as_deref(),
        ),
        attributes,
    })
}

/// Lists public Replicate models (first page).
#[derive(Debug, Clone)]
pub struct ReplicateFetcher {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl ReplicateFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl SourceFetcher for ReplicateFetcher {
    fn label(&self) -> &str {
        LABEL
    }

    fn source_name(&self) -> SourceName {
        SourceName::Secondary
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let Some(token) = &self.token else {
            return Ok(not_configured(LABEL, "REPLICATE_API_TOKEN"));
        };

        // The page size is fixed server-side.
        let request = ListingRequest::new(LABEL, endpoint(&self.base_url, "models"))
            .with_auth(Auth::Bearer(token.clone()));

        let body = self.client.get_json(request).await?;
        listing(LABEL, body, "/results", normalize)
    }
}
