use crate::config::Config;
use crate::news::Article;
use crate::openai::{chat_completion, strip_code_fence};
use crate::post::{LinkedInPost, DEFAULT_TITLE};
use crate::validator::PostValidator;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Placeholder Spanish body when the model reply could not be parsed
pub const SPANISH_PARSE_FAILURE: &str = "Error: Could not parse Spanish version";

/// Article as presented to the model (source attribution omitted)
#[derive(Debug, Serialize)]
struct PromptArticle<'a> {
    title: &'a str,
    summary: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct PromptPayload<'a> {
    articles: Vec<PromptArticle<'a>>,
}

fn build_post_system_prompt() -> &'static str {
    r#"You are the communications assistant for a technology company's LinkedIn page.

Goal: turn recent AI news into one professional, bilingual LinkedIn post.

You will receive recent AI-related news articles as JSON. Your task:
1. Read the articles and pick the single most relevant one.
2. Summarize its core insight or key takeaway.
3. Write a concise, company-branded LinkedIn post in two languages:
   - English
   - Spanish (localized for a Spanish-speaking audience, not a literal translation)
4. Include the original article link and relevant hashtags in both versions.
5. Keep the tone informative and professional, suitable for a company audience.

Constraints:
- Avoid hype and speculative language.
- Both versions must be ready to publish: polished and fluent.
- Each version must not exceed 120 words.
- Use the same hashtags in both versions.

Input format:
{"articles": [{"title": "...", "summary": "...", "url": "..."}]}

Respond with JSON only, no prose and no code fences:
{"title": "...", "post_body_en": "...", "post_body_es": "...", "link": "..."}"#
}

fn build_post_user_prompt(articles: &[Article]) -> Result<String> {
    let payload = PromptPayload {
        articles: articles
            .iter()
            .map(|a| PromptArticle {
                title: &a.title,
                summary: &a.summary,
                url: &a.url,
            })
            .collect(),
    };

    serde_json::to_string_pretty(&payload).context("Failed to serialize articles for the prompt")
}

/// Draft a bilingual LinkedIn post from the given articles.
///
/// A reply that is not valid JSON still yields a post: the raw reply becomes
/// the English body so the user can salvage it by hand.
pub async fn generate_post(
    client: &reqwest::Client,
    config: &Config,
    articles: &[Article],
) -> Result<LinkedInPost> {
    if articles.is_empty() {
        anyhow::bail!("No articles provided for post generation");
    }

    info!(
        "Generating LinkedIn post from {} articles with {}",
        articles.len(),
        config.openai_model
    );

    let user_prompt = build_post_user_prompt(articles)?;
    let reply = chat_completion(client, config, build_post_system_prompt(), &user_prompt)
        .await
        .context("Failed to generate post with OpenAI")?;

    let post = parse_post_reply(&reply, articles);

    let report = PostValidator::validate(&post);
    for error in &report.errors {
        warn!("Post validation error: {}", error);
    }
    for warning in &report.warnings {
        warn!("Post validation warning: {}", warning);
    }

    Ok(post)
}

/// Turn the model reply into a post, filling gaps from the first article
fn parse_post_reply(reply: &str, articles: &[Article]) -> LinkedInPost {
    let first_url = articles.first().map(|a| a.url.clone()).unwrap_or_default();

    match serde_json::from_str::<LinkedInPost>(strip_code_fence(reply)) {
        Ok(mut post) if !post.post_body_en.trim().is_empty() => {
            if post.link.trim().is_empty() {
                post.link = first_url;
            }
            if post.title.trim().is_empty() {
                post.title = articles
                    .first()
                    .map(|a| a.title.clone())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());
            }
            post
        }
        parsed => {
            match parsed {
                Err(e) => warn!("OpenAI reply is not valid JSON ({}), keeping raw content", e),
                Ok(_) => warn!("OpenAI reply has no English body, keeping raw content"),
            }
            LinkedInPost {
                title: DEFAULT_TITLE.to_string(),
                post_body_en: reply.trim().to_string(),
                post_body_es: SPANISH_PARSE_FAILURE.to_string(),
                link: first_url,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn articles() -> Vec<Article> {
        vec![
            Article {
                title: "Lab ships new reasoning model".to_string(),
                summary: "The model beats benchmarks.".to_string(),
                url: "https://example.com/model".to_string(),
                source: "TechCrunch".to_string(),
            },
            Article {
                title: "Chips get faster".to_string(),
                summary: "Inference costs drop.".to_string(),
                url: "https://example.com/chips".to_string(),
                source: "Wired".to_string(),
            },
        ]
    }

    #[test]
    fn test_user_prompt_payload_shape() {
        let prompt = build_post_user_prompt(&articles()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();

        let items = value["articles"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Lab ships new reasoning model");
        assert_eq!(items[0]["url"], "https://example.com/model");
        assert!(items[0].get("source").is_none());
    }

    #[test]
    fn test_system_prompt_constraints() {
        let prompt = build_post_system_prompt();
        assert!(prompt.contains("120 words"));
        assert!(prompt.contains("Spanish"));
        assert!(prompt.contains("post_body_es"));
        assert!(prompt.contains("hashtags"));
    }

    #[test]
    fn test_parse_valid_reply() {
        let reply = r#"{"title": "Reasoning", "post_body_en": "EN #AI", "post_body_es": "ES #AI", "link": "https://example.com/model"}"#;
        let post = parse_post_reply(reply, &articles());

        assert_eq!(post.title, "Reasoning");
        assert_eq!(post.post_body_en, "EN #AI");
        assert_eq!(post.post_body_es, "ES #AI");
        assert_eq!(post.link, "https://example.com/model");
    }

    #[test]
    fn test_parse_fenced_reply_fills_missing_fields() {
        let reply = "```json\n{\"post_body_en\": \"EN\", \"post_body_es\": \"ES\"}\n```";
        let post = parse_post_reply(reply, &articles());

        assert_eq!(post.title, "Lab ships new reasoning model");
        assert_eq!(post.link, "https://example.com/model");
    }

    #[test]
    fn test_parse_invalid_reply_falls_back() {
        let reply = "Here is your post: AI is moving fast.";
        let post = parse_post_reply(reply, &articles());

        assert_eq!(post.title, DEFAULT_TITLE);
        assert_eq!(post.post_body_en, reply);
        assert_eq!(post.post_body_es, SPANISH_PARSE_FAILURE);
        assert_eq!(post.link, "https://example.com/model");
    }

    #[test]
    fn test_parse_json_without_body_falls_back() {
        let post = parse_post_reply(r#"{"headline": "x"}"#, &articles());
        assert_eq!(post.post_body_en, r#"{"headline": "x"}"#);
        assert_eq!(post.post_body_es, SPANISH_PARSE_FAILURE);
    }

    #[tokio::test]
    async fn test_generate_post_rejects_empty_articles() {
        let client = reqwest::Client::new();
        let err = generate_post(&client, &test_config(), &[]).await.unwrap_err();
        assert!(err.to_string().contains("No articles provided"));
    }

    #[tokio::test]
    async fn test_generate_post_end_to_end() {
        let server = MockServer::start().await;
        let content = serde_json::json!({
            "title": "Reasoning model",
            "post_body_en": "A new reasoning model shipped. https://example.com/model #AI",
            "post_body_es": "Se lanzó un nuevo modelo. https://example.com/model #AI",
            "link": "https://example.com/model"
        })
        .to_string();

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("Lab ships new reasoning model"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.openai_api_url = format!("{}/v1/chat/completions", server.uri());

        let client = reqwest::Client::new();
        let post = generate_post(&client, &config, &articles()).await.unwrap();

        assert_eq!(post.title, "Reasoning model");
        assert!(post.post_body_es.contains("nuevo modelo"));
    }
}
