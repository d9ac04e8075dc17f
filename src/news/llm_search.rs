use super::Article;
use crate::config::Config;
use crate::openai::{chat_completion, strip_code_fence};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchReply {
    Wrapped { articles: Vec<SearchArticle> },
    Bare(Vec<SearchArticle>),
}

#[derive(Debug, Deserialize)]
struct SearchArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

fn build_search_system_prompt() -> &'static str {
    r#"You are a research assistant that tracks artificial intelligence news.

List the most significant recent AI developments you know about (model releases,
research results, product launches, regulation).

Rules:
- Return at most 3 items, most important first
- Only include real events; never invent articles or URLs
- Use the original publisher URL when you know it, otherwise an empty string
- Summaries are one or two factual sentences, no hype

Respond with JSON only, no prose and no code fences:
{"articles": [{"title": "...", "summary": "...", "url": "..."}]}"#
}

fn build_search_user_prompt(query: &str) -> String {
    format!(
        "Today is {}. Find the latest news about: {}",
        Utc::now().format("%Y-%m-%d"),
        query
    )
}

/// Last-resort source: ask the LLM for recent AI news as structured JSON
pub async fn search_with_llm(client: &reqwest::Client, config: &Config) -> Result<Vec<Article>> {
    info!("Asking {} for recent AI news", config.openai_model);
    let reply = chat_completion(
        client,
        config,
        build_search_system_prompt(),
        &build_search_user_prompt(&config.news_query),
    )
    .await?;

    parse_search_reply(&reply)
}

fn parse_search_reply(reply: &str) -> Result<Vec<Article>> {
    let parsed: SearchReply = serde_json::from_str(strip_code_fence(reply))
        .context("LLM search reply was not valid JSON")?;

    let items = match parsed {
        SearchReply::Wrapped { articles } => articles,
        SearchReply::Bare(articles) => articles,
    };

    Ok(items
        .into_iter()
        .filter(|a| !a.title.trim().is_empty() && !a.summary.trim().is_empty())
        .map(|a| Article {
            title: a.title.trim().to_string(),
            summary: a.summary.trim().to_string(),
            url: a.url.trim().to_string(),
            source: "LLM search".to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_reply() {
        let reply = r#"{"articles": [
            {"title": "Open model tops leaderboard", "summary": "A new open model.", "url": "https://example.com/a"},
            {"title": "", "summary": "No title", "url": ""}
        ]}"#;

        let articles = parse_search_reply(reply).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Open model tops leaderboard");
        assert_eq!(articles[0].source, "LLM search");
    }

    #[test]
    fn test_parse_bare_array_in_code_fence() {
        let reply = "```json\n[{\"title\": \"T\", \"summary\": \"S\"}]\n```";
        let articles = parse_search_reply(reply).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "");
    }

    #[test]
    fn test_parse_prose_fails() {
        assert!(parse_search_reply("Here are some news items...").is_err());
    }

    #[test]
    fn test_user_prompt_includes_query_and_date() {
        let prompt = build_search_user_prompt("robotics");
        assert!(prompt.contains("robotics"));
        assert!(prompt.contains(&Utc::now().format("%Y").to_string()));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        let prompt = build_search_system_prompt();
        assert!(prompt.contains("JSON only"));
        assert!(prompt.contains("never invent"));
    }
}
