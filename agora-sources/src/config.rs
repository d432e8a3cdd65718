//! Provider configuration loaded from the environment.

/// Default `User-Agent` sent to every provider.
pub const DEFAULT_USER_AGENT: &str = concat!("agora-catalog/", env!("CARGO_PKG_VERSION"));

/// Default number of records requested per provider per refresh.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on the page size; most providers reject larger pages.
pub const MAX_PAGE_SIZE: usize = 100;

/// Kaggle API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl std::fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Base URLs for each provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub huggingface: String,
    pub kaggle: String,
    pub data_gov: String,
    pub github: String,
    pub gitlab: String,
    pub replicate: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            huggingface: "https://huggingface.co".to_string(),
            kaggle: "https://www.kaggle.com/api/v1".to_string(),
            data_gov: "https://catalog.data.gov/api/3".to_string(),
            github: "https://api.github.com".to_string(),
            gitlab: "https://gitlab.com/api/v4".to_string(),
            replicate: "https://api.replicate.com/v1".to_string(),
        }
    }
}

/// Settings for every upstream provider.
///
/// A provider whose required credentials are absent is "not configured":
/// its fetcher returns an empty listing instead of failing.
#[derive(Clone, PartialEq, Eq)]
pub struct SourcesConfig {
    pub user_agent: String,
    pub page_size: usize,
    pub hf_token: Option<String>,
    pub kaggle: Option<KaggleCredentials>,
    pub github_token: Option<String>,
    pub github_query: String,
    pub gitlab_token: Option<String>,
    pub gitlab_topic: Option<String>,
    pub data_gov_query: String,
    pub replicate_token: Option<String>,
    pub endpoints: Endpoints,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            hf_token: None,
            kaggle: None,
            github_token: None,
            github_query: "topic:machine-learning".to_string(),
            gitlab_token: None,
            gitlab_topic: Some("machine-learning".to_string()),
            data_gov_query: "machine learning".to_string(),
            replicate_token: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl SourcesConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let kaggle = match (var("KAGGLE_USERNAME"), var("KAGGLE_KEY")) {
            (Some(username), Some(key)) => Some(KaggleCredentials { username, key }),
            _ => None,
        };

        let page_size = var("AGORA_SOURCE_PAGE_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(MAX_PAGE_SIZE))
            .unwrap_or(defaults.page_size);

        Self {
            user_agent: var("AGORA_USER_AGENT").unwrap_or(defaults.user_agent),
            page_size,
            hf_token: var("HF_TOKEN"),
            kaggle,
            github_token: var("GITHUB_TOKEN"),
            github_query: var("AGORA_GITHUB_QUERY").unwrap_or(defaults.github_query),
            gitlab_token: var("GITLAB_TOKEN"),
            gitlab_topic: var("AGORA_GITLAB_TOPIC").or(defaults.gitlab_topic),
            data_gov_query: var("AGORA_DATA_GOV_QUERY").unwrap_or(defaults.data_gov_query),
            replicate_token: var("REPLICATE_API_TOKEN"),
            endpoints: defaults.endpoints,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl std::fmt::Debug for SourcesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("SourcesConfig")
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("hf_token", &redact(&self.hf_token))
            .field("kaggle", &self.kaggle)
            .field("github_token", &redact(&self.github_token))
            .field("github_query", &self.github_query)
            .field("gitlab_token", &redact(&self.gitlab_token))
            .field("gitlab_topic", &self.gitlab_topic)
            .field("data_gov_query", &self.data_gov_query)
            .field("replicate_token", &redact(&self.replicate_token))
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
