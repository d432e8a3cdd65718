//! GitLab project listing, sorted by star count and optionally filtered by topic.

use agora_catalog::SourceFetcher;
use agora_core::{attr, CatalogEntry, NormalizationError, SourceError, SourceName};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Auth, HttpClient, ListingRequest};
use crate::normalize::{classify, decode, identity, or_unknown, parse_timestamp, require};
use crate::providers::{endpoint, listing};

pub const LABEL: &str = "gitlab-projects";

#[derive(Debug, Deserialize)]
struct Project {
    path_with_namespace: Option<String>,
    name: Option<String>,
    description: Option<String>,
    web_url: Option<String>,
    star_count: Option<u64>,
    topics: Option<Vec<String>>,
    tag_list: Option<Vec<String>>,
    last_activity_at: Option<String>,
    namespace: Option<Namespace>,
}

#[derive(Debug, Deserialize)]
struct Namespace {
    name: Option<String>,
}

pub fn normalize(record: Value) -> Result<CatalogEntry, NormalizationError> {
    let raw: Project = decode(LABEL, record)?;
    let path = require(LABEL, "path_with_namespace", raw.path_with_namespace)?;
    // Older instances still send `tag_list`.
    let topics = raw.topics.or(raw.tag_list).unwrap_or_default();

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::AUTHOR.to_string(), or_unknown(raw.namespace.and_then(|n| n.name)));
    // The project listing carries neither language nor license.
    attributes.insert(attr::LANGUAGE.to_string(), or_unknown(None));
    attributes.insert(attr::LICENSE.to_string(), or_unknown(None));

    Ok(CatalogEntry {
        id: identity(LABEL, "path_with_namespace", &path)?,
        name: raw.name.unwrap_or_else(|| path.clone()),
        description: raw.description.unwrap_or_default(),
        source_name: SourceName::Secondary,
        category: classify(topics.iter().map(String::as_str)).to_string(),
        tags: topics,
        popularity: raw.star_count.unwrap_or(0),
        last_updated: parse_timestamp(raw.last_activity_at.as_deref()),
        url: raw.web_url.unwrap_or_else(|| format!("https://gitlab.com/{path}")),
        attributes,
    })
}

/// Lists public GitLab projects.
#[derive(Debug, Clone)]
pub struct GitLabFetcher {
    client: HttpClient,
    base_url: String,
    topic: Option<String>,
    token: Option<String>,
    page_size: usize,
}

impl GitLabFetcher {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            topic: None,
            token: None,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn auth(&self) -> Auth {
        self.token.as_ref().map_or(Auth::None, |token| Auth::Header {
            name: "PRIVATE-TOKEN",
            value: token.clone(),
        })
    }
}

#[async_trait]
impl SourceFetcher for GitLabFetcher {
    fn label(&self) -> &str {
        LABEL
    }

    fn source_name(&self) -> SourceName {
        SourceName::Secondary
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>, SourceError> {
        let mut request = ListingRequest::new(LABEL, endpoint(&self.base_url, "projects"))
            .with_query("order_by", "star_count")
            .with_query("sort", "desc")
            .with_query("visibility", "public")
            .with_query("per_page", self.page_size)
            .with_auth(self.auth());
        if let Some(topic) = &self.topic {
            request = request.with_query("topic", topic);
        }

        let body = self.client.get_json(request).await?;
        listing(LABEL, body, "", normalize)
    }
}
