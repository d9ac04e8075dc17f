//! News fetching with an ordered fallback chain.
//!
//! Sources are tried in the configured order (NewsAPI, Google News RSS,
//! Medium, LLM search by default). The first source that yields at least one
//! article wins; failures and empty results move on to the next source.

mod google;
mod llm_search;
mod medium;
mod newsapi;

pub use google::fetch_from_google_news;
pub use llm_search::search_with_llm;
pub use medium::fetch_from_medium;
pub use newsapi::fetch_from_newsapi;

use crate::config::Config;
use crate::retry::{is_retryable_error, with_retry_if, HttpStatusError, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Source that produced the article (e.g. "NewsAPI")
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewsSource {
    NewsApi,
    GoogleNews,
    Medium,
    LlmSearch,
}

impl NewsSource {
    pub fn default_order() -> Vec<NewsSource> {
        vec![
            NewsSource::NewsApi,
            NewsSource::GoogleNews,
            NewsSource::Medium,
            NewsSource::LlmSearch,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NewsSource::NewsApi => "NewsAPI",
            NewsSource::GoogleNews => "Google News",
            NewsSource::Medium => "Medium",
            NewsSource::LlmSearch => "LLM search",
        }
    }

    async fn fetch(&self, client: &reqwest::Client, config: &Config) -> Result<Vec<Article>> {
        match self {
            NewsSource::NewsApi => fetch_from_newsapi(client, config).await,
            NewsSource::GoogleNews => fetch_from_google_news(client, config).await,
            NewsSource::Medium => fetch_from_medium(client, config).await,
            NewsSource::LlmSearch => search_with_llm(client, config).await,
        }
    }
}

impl fmt::Display for NewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NewsSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newsapi" => Ok(NewsSource::NewsApi),
            "google" | "google_news" | "googlenews" => Ok(NewsSource::GoogleNews),
            "medium" => Ok(NewsSource::Medium),
            "llm" | "llm_search" | "openai" => Ok(NewsSource::LlmSearch),
            other => anyhow::bail!("Unknown news source '{}'", other),
        }
    }
}

/// Fetch the latest AI news, walking the configured sources in order.
///
/// Returns an empty list when no source produced anything; callers decide
/// whether that is fatal.
pub async fn fetch_latest_news(client: &reqwest::Client, config: &Config) -> Vec<Article> {
    info!("Fetching latest AI news");

    for source in &config.news_sources {
        match source.fetch(client, config).await {
            Ok(articles) if !articles.is_empty() => {
                let articles = dedup_and_limit(articles, config.max_articles);
                info!("✓ {} returned {} articles", source, articles.len());
                return articles;
            }
            Ok(_) => info!("{} returned no articles, trying next source", source),
            Err(e) => warn!("✗ {} failed: {:#}", source, e),
        }
    }

    warn!("No articles found from any source");
    Vec::new()
}

/// Drop articles whose exact title was already seen, then keep the first `limit`
pub fn dedup_and_limit(articles: Vec<Article>, limit: usize) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.title.clone()))
        .take(limit)
        .collect()
}

/// GET a URL and return the body, retrying transient failures
async fn fetch_body(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String> {
    with_retry_if(
        &RetryConfig::news_feed(),
        service,
        || async {
            let response = client
                .get(url)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", service))?;

            if !response.status().is_success() {
                return Err(anyhow::Error::new(
                    HttpStatusError::from_response(service, response).await,
                ));
            }

            response
                .text()
                .await
                .with_context(|| format!("Failed to read {} response", service))
        },
        is_retryable_error,
    )
    .await
}
