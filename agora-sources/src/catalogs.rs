//! Per-catalog fetcher lists.
//!
//! The order returned here is the invocation order, and with it the
//! last-write-wins precedence used by deduplication.

use std::sync::Arc;

use agora_catalog::SourceFetcher;
use agora_core::CatalogKind;

use crate::client::HttpClient;
use crate::config::SourcesConfig;
use crate::providers::ckan::CkanFetcher;
use crate::providers::github::GitHubFetcher;
use crate::providers::gitlab::GitLabFetcher;
use crate::providers::huggingface::{HubListing, HuggingFaceFetcher};
use crate::providers::kaggle::KaggleFetcher;
use crate::providers::replicate::ReplicateFetcher;

/// Build the ordered fetcher list for one catalog.
pub fn fetchers_for(
    kind: CatalogKind,
    config: &SourcesConfig,
    client: &HttpClient,
) -> Vec<Arc<dyn SourceFetcher>> {
    let endpoints = &config.endpoints;
    let page_size = config.page_size;
    match kind {
        CatalogKind::Datasets => vec![
            shared(
                HuggingFaceFetcher::new(client.clone(), &endpoints.huggingface, HubListing::Datasets)
                    .with_token(config.hf_token.clone())
                    .with_page_size(page_size),
            ),
            shared(
                KaggleFetcher::new(client.clone(), &endpoints.kaggle)
                    .with_credentials(config.kaggle.clone())
                    .with_page_size(page_size),
            ),
            shared(
                CkanFetcher::new(client.clone(), &endpoints.data_gov, &config.data_gov_query)
                    .with_page_size(page_size),
            ),
        ],
        CatalogKind::Repositories => vec![
            shared(
                GitHubFetcher::new(client.clone(), &endpoints.github, &config.github_query)
                    .with_token(config.github_token.clone())
                    .with_page_size(page_size),
            ),
            shared(
                GitLabFetcher::new(client.clone(), &endpoints.gitlab)
                    .with_topic(config.gitlab_topic.clone())
                    .with_token(config.gitlab_token.clone())
                    .with_page_size(page_size),
            ),
        ],
        CatalogKind::Models => vec![
            shared(
                HuggingFaceFetcher::new(client.clone(), &endpoints.huggingface, HubListing::Models)
                    .with_token(config.hf_token.clone())
                    .with_page_size(page_size),
            ),
            shared(
                ReplicateFetcher::new(client.clone(), &endpoints.replicate)
                    .with_token(config.replicate_token.clone()),
            ),
        ],
    }
}

fn shared(fetcher: impl SourceFetcher + 'static) -> Arc<dyn SourceFetcher> {
    Arc::new(fetcher)
}
