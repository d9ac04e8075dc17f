use anyhow::{Context, Result};
use tracing::warn;

use crate::news::NewsSource;

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub post_max_tokens: u32,

    // News sources
    pub newsapi_key: Option<String>,
    pub newsapi_url: String,
    pub google_news_rss_url: String,
    pub medium_tag_url: String,
    pub news_query: String,
    pub news_sources: Vec<NewsSource>,
    pub max_articles: usize,

    // LinkedIn publishing
    pub linkedin_access_token: Option<String>,
    pub linkedin_company_id: Option<String>,
    pub linkedin_api_url: String,
    pub linkedin_api_version: String,

    // LinkedIn OAuth
    pub linkedin_client_id: Option<String>,
    pub linkedin_client_secret: Option<String>,
    pub linkedin_redirect_uri: String,
    pub linkedin_oauth_url: String,

    // Files
    pub post_file: String,
    pub env_file: String,

    // Web UI
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // OpenAI
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            post_max_tokens: parse_var("POST_MAX_TOKENS", 1000),

            // News sources
            newsapi_key: non_empty_var("NEWSAPI_KEY"),
            newsapi_url: std::env::var("NEWSAPI_URL")
                .unwrap_or_else(|_| "https://newsapi.org/v2/everything".to_string()),
            google_news_rss_url: std::env::var("GOOGLE_NEWS_RSS_URL").unwrap_or_else(|_| {
                "https://news.google.com/rss/search?q=artificial+intelligence+AI&hl=en-US&gl=US&ceid=US:en"
                    .to_string()
            }),
            medium_tag_url: std::env::var("MEDIUM_TAG_URL")
                .unwrap_or_else(|_| "https://medium.com/tag/artificial-intelligence".to_string()),
            news_query: std::env::var("NEWS_QUERY")
                .unwrap_or_else(|_| "artificial intelligence OR AI OR machine learning".to_string()),
            news_sources: std::env::var("NEWS_SOURCES")
                .map(|v| parse_news_sources(&v))
                .unwrap_or_else(|_| NewsSource::default_order()),
            // Zero would leave every run without articles
            max_articles: match parse_var("MAX_ARTICLES", DEFAULT_MAX_ARTICLES) {
                0 => DEFAULT_MAX_ARTICLES,
                n => n,
            },

            // LinkedIn publishing
            linkedin_access_token: non_empty_var("LINKEDIN_ACCESS_TOKEN"),
            linkedin_company_id: non_empty_var("LINKEDIN_COMPANY_ID"),
            linkedin_api_url: std::env::var("LINKEDIN_API_URL")
                .unwrap_or_else(|_| "https://api.linkedin.com".to_string()),
            linkedin_api_version: std::env::var("LINKEDIN_API_VERSION")
                .unwrap_or_else(|_| "202401".to_string()),

            // LinkedIn OAuth
            linkedin_client_id: non_empty_var("LINKEDIN_CLIENT_ID"),
            linkedin_client_secret: non_empty_var("LINKEDIN_CLIENT_SECRET"),
            linkedin_redirect_uri: std::env::var("LINKEDIN_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/callback".to_string()),
            linkedin_oauth_url: std::env::var("LINKEDIN_OAUTH_URL")
                .unwrap_or_else(|_| "https://www.linkedin.com/oauth/v2".to_string()),

            // Files
            post_file: std::env::var("POST_FILE")
                .unwrap_or_else(|_| "linkedin_post.json".to_string()),
            env_file: std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".to_string()),

            // Web UI
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 5001),
            api_key: non_empty_var("API_KEY"),
        })
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY not set")
    }

    pub fn linkedin_access_token(&self) -> Result<&str> {
        self.linkedin_access_token
            .as_deref()
            .context("LINKEDIN_ACCESS_TOKEN not set")
    }

    pub fn linkedin_company_id(&self) -> Result<&str> {
        self.linkedin_company_id
            .as_deref()
            .context("LINKEDIN_COMPANY_ID not set")
    }

    /// True when both the access token and the company page id are present
    pub fn can_publish(&self) -> bool {
        self.linkedin_access_token.is_some() && self.linkedin_company_id.is_some()
    }
}

/// Read an env var, treating an empty value the same as an unset one
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const DEFAULT_MAX_ARTICLES: usize = 2;

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a comma-separated source list such as `newsapi,google,medium,llm`
pub fn parse_news_sources(value: &str) -> Vec<NewsSource> {
    let mut sources = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<NewsSource>() {
            Ok(source) if !sources.contains(&source) => sources.push(source),
            Ok(_) => {}
            Err(e) => warn!("Ignoring news source '{}': {}", name, e),
        }
    }

    if sources.is_empty() {
        warn!("NEWS_SOURCES contained no usable source, using default order");
        return NewsSource::default_order();
    }

    sources
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        openai_api_key: Some("test-openai-key".to_string()),
        openai_model: "gpt-4o-mini".to_string(),
        openai_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        post_max_tokens: 1000,
        newsapi_key: None,
        newsapi_url: "http://127.0.0.1:9/v2/everything".to_string(),
        google_news_rss_url: "http://127.0.0.1:9/rss/search".to_string(),
        medium_tag_url: "http://127.0.0.1:9/tag/artificial-intelligence".to_string(),
        news_query: "artificial intelligence".to_string(),
        news_sources: NewsSource::default_order(),
        max_articles: 2,
        linkedin_access_token: Some("test-linkedin-token".to_string()),
        linkedin_company_id: Some("12345".to_string()),
        linkedin_api_url: "http://127.0.0.1:9".to_string(),
        linkedin_api_version: "202401".to_string(),
        linkedin_client_id: Some("client-id".to_string()),
        linkedin_client_secret: Some("client-secret".to_string()),
        linkedin_redirect_uri: "http://localhost:8080/callback".to_string(),
        linkedin_oauth_url: "http://127.0.0.1:9/oauth/v2".to_string(),
        post_file: "linkedin_post.json".to_string(),
        env_file: ".env".to_string(),
        host: "127.0.0.1".to_string(),
        port: 5001,
        api_key: None,
    }
}
