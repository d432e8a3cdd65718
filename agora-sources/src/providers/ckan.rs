//! CKAN `package_search` (catalog.data.gov). Public, no credentials.

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{HttpClient, ListingRequest};
use crate::normalize::{classify, decode, identity, or_unknown, parse_timestamp, require};
use crate::providers::{endpoint, listing};

pub const LABEL: &str = "data-gov";

#[derive(Debug, Deserialize)]
struct Package {
    name: Option<String>,
    title: Option<String>,
    notes: Option<String>,
    metadata_modified: Option<String>,
    license_title: Option<String>,
    organization: Option<Organization>,
    tags: Option<Vec<Tag>>,
    resources: Option<Vec<Resource>>,
    tracking_summary: Option<TrackingSummary>,
    num_resources: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackingSummary {
    total: Option<u64>,
}

pub fn normalize(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: Package = decode(LABEL, record)?;
    let name = require(LABEL, "name", raw.name)?;

    let tags: Vec<String> = raw
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| t.name)
        .collect();

    // First non-empty resource format, upper-cased (CSV, JSON, ...).
    let format = raw
        .resources
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| r.format)
        .map(|f| f.trim().to_uppercase())
        .find(|f| !f.is_empty());

    let mut labels: Vec<&str> = tags.iter().map(String::as_str).collect();
    if let Some(format) = &format {
        labels.push(format);
    }
    let category = classify(labels);

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::FORMAT.to_string(), or_unknown(format));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(raw.license_title));
    attributes.insert(attr::AUTHOR.to_string(), or_unknown(raw.organization.and_then(|o| o.title)));
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(None));
    attributes.insert(
        attr::SIZE.to_string(),
        or_unknown(raw.num_resources.map(|n| format!("{n} resources"))),
    );

    Ok(CatalogEntry {
        id: identity(LABEL, "name", &format!("data-gov/{name}"))?,
        name: raw.title.unwrap_or_else(|| name.clone()),
        description: raw.notes.unwrap_or_default().trim().to_string(),
        source_name: SourceName::Public,
        tags,
        category: category.to_string(),
        popularity: raw.tracking_summary.and_then(|t| t.total).unwrap_or(0),
        last_updated: parse_timestamp(raw.metadata_modified.as_deref()),
        url: format!("https://catalog.data.gov/dataset/{name}"),
        attributes,
    })
}

/// Searches a CKAN catalog for packages matching a query.
#[derive(Debug, Clone)]
pub struct CkanFetcher {
    client: HttpClient,
    base_url: String,
    query: String,
    page_size: usize,
}

impl CkanFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            query: query.into(),
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl SourceFetcher for CkanFetcher {
    fn label(&self) -> &str {
        LABEL
    }

    fn source_name(&self) -> SourceName {
        SourceName::Public
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let request = ListingRequest::new(LABEL, endpoint(&self.base_url, "action/package_search"))
            .with_query("q", &self.query)
            .with_query("rows", self.page_size)
            .with_query("sort", "views_recent desc");

        let body = self.client.get_json(request).await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(SourceError::InvalidResponse {
                provider: LABEL.to_string(),
                reason: "package_search reported success=false".to_string(),
            });
        }
        listing(LABEL, body, "/result/results", normalize)
    }
}
