use super::{fetch_body, Article};
use crate::config::Config;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// Fetch AI headlines from NewsAPI's `everything` endpoint.
///
/// Without `NEWSAPI_KEY` the source is skipped (empty result, not an error).
pub async fn fetch_from_newsapi(client: &reqwest::Client, config: &Config) -> Result<Vec<Article>> {
    let Some(api_key) = config.newsapi_key.as_deref() else {
        warn!("NEWSAPI_KEY not set, skipping NewsAPI");
        return Ok(Vec::new());
    };

    info!("Querying NewsAPI for '{}'", config.news_query);
    let body = fetch_body(
        client,
        "NewsAPI",
        &config.newsapi_url,
        &[
            ("q", config.news_query.as_str()),
            ("language", "en"),
            ("sortBy", "publishedAt"),
            ("pageSize", "5"),
            ("apiKey", api_key),
        ],
    )
    .await?;

    parse_newsapi_response(&body)
}

fn parse_newsapi_response(body: &str) -> Result<Vec<Article>> {
    let response: NewsApiResponse =
        serde_json::from_str(body).context("Failed to parse NewsAPI response")?;

    let articles = response
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            let summary = a.description.filter(|d| !d.trim().is_empty())?;
            Some(Article {
                title: title.trim().to_string(),
                summary: summary.trim().to_string(),
                url: a.url.unwrap_or_default(),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "NewsAPI".to_string()),
            })
        })
        .collect();

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn newsapi_body() -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {
                    "source": { "id": null, "name": "TechCrunch" },
                    "title": "Lab ships new reasoning model",
                    "description": "The model beats benchmarks.",
                    "url": "https://techcrunch.com/model"
                },
                {
                    "source": { "id": null, "name": "Wired" },
                    "title": "No description here",
                    "description": null,
                    "url": "https://wired.com/x"
                },
                {
                    "source": null,
                    "title": "Chips get faster",
                    "description": "Inference costs drop.",
                    "url": "https://example.com/chips"
                }
            ]
        })
    }

    #[test]
    fn test_parse_skips_articles_without_description() {
        let articles = parse_newsapi_response(&newsapi_body().to_string()).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Lab ships new reasoning model");
        assert_eq!(articles[0].summary, "The model beats benchmarks.");
        assert_eq!(articles[0].source, "TechCrunch");
        assert_eq!(articles[1].source, "NewsAPI");
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_newsapi_response("<html>").is_err());
    }

    #[tokio::test]
    async fn test_skipped_without_key() {
        let mut config = test_config();
        config.newsapi_key = None;

        let client = reqwest::Client::new();
        let articles = fetch_from_newsapi(&client, &config).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("apiKey", "news-key"))
            .and(query_param("language", "en"))
            .and(query_param("sortBy", "publishedAt"))
            .and(query_param("pageSize", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(newsapi_body()))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.newsapi_key = Some("news-key".to_string());
        config.newsapi_url = format!("{}/v2/everything", server.uri());

        let client = reqwest::Client::new();
        let articles = fetch_from_newsapi(&client, &config).await.unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_is_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "code": "apiKeyInvalid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.newsapi_key = Some("bad".to_string());
        config.newsapi_url = format!("{}/v2/everything", server.uri());

        let client = reqwest::Client::new();
        let err = fetch_from_newsapi(&client, &config).await.unwrap_err();
        assert!(err.to_string().contains("NewsAPI API error (401)"));
    }
}
