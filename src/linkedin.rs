use crate::config::Config;
use crate::language::Language;
use crate::post::LinkedInPost;
use crate::retry::HttpStatusError;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Characters of post text reused as the link preview description
const PREVIEW_DESCRIPTION_CHARS: usize = 200;

// UGC post payload (https://learn.microsoft.com/linkedin/compliance/integrations/shares/ugc-post-api)

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UgcPost {
    author: String,
    lifecycle_state: &'static str,
    specific_content: SpecificContent,
    visibility: Visibility,
}

#[derive(Debug, Serialize)]
struct SpecificContent {
    #[serde(rename = "com.linkedin.ugc.ShareContent")]
    share_content: ShareContent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareContent {
    share_commentary: TextValue,
    share_media_category: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    media: Vec<ShareMedia>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareMedia {
    status: &'static str,
    description: TextValue,
    original_url: String,
    title: TextValue,
}

#[derive(Debug, Serialize)]
struct TextValue {
    text: String,
}

#[derive(Debug, Serialize)]
struct Visibility {
    #[serde(rename = "com.linkedin.ugc.MemberNetworkVisibility")]
    member_network_visibility: &'static str,
}

/// A post that LinkedIn accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPost {
    pub language: &'static str,
    pub post_id: String,
    pub url: String,
}

/// Which versions of a post to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    English,
    Spanish,
    Both,
}

impl PublishTarget {
    pub fn languages(&self) -> Vec<Language> {
        match self {
            PublishTarget::English => vec![Language::ENGLISH],
            PublishTarget::Spanish => vec![Language::SPANISH],
            PublishTarget::Both => Language::all().to_vec(),
        }
    }
}

impl FromStr for PublishTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "en" | "english" => Ok(PublishTarget::English),
            "2" | "es" | "spanish" => Ok(PublishTarget::Spanish),
            "3" | "both" | "all" => Ok(PublishTarget::Both),
            other => anyhow::bail!("Invalid choice '{}': expected en, es or both", other),
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishTarget::English => f.write_str("English"),
            PublishTarget::Spanish => f.write_str("Spanish"),
            PublishTarget::Both => f.write_str("English and Spanish"),
        }
    }
}

/// Outcome of publishing one language version
#[derive(Debug)]
pub struct PublishOutcome {
    pub language: Language,
    pub result: Result<PublishedPost>,
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Build the UGC share for one language version of a post
pub fn build_share_payload(company_id: &str, post: &LinkedInPost, language: Language) -> UgcPost {
    let text = post.body(language).trim().to_string();

    let media = if post.has_link() {
        vec![ShareMedia {
            status: "READY",
            description: TextValue {
                text: truncate_chars(&text, PREVIEW_DESCRIPTION_CHARS),
            },
            original_url: post.link.trim().to_string(),
            title: TextValue {
                text: post.display_title().to_string(),
            },
        }]
    } else {
        Vec::new()
    };

    UgcPost {
        author: format!("urn:li:organization:{}", company_id),
        lifecycle_state: "PUBLISHED",
        specific_content: SpecificContent {
            share_content: ShareContent {
                share_commentary: TextValue { text },
                share_media_category: if media.is_empty() { "NONE" } else { "ARTICLE" },
                media,
            },
        },
        visibility: Visibility {
            member_network_visibility: "PUBLIC",
        },
    }
}

/// Publish one language version to the company page.
///
/// Not retried: a timeout after LinkedIn accepted the share would
/// otherwise publish it twice.
pub async fn publish_post(
    client: &reqwest::Client,
    config: &Config,
    post: &LinkedInPost,
    language: Language,
) -> Result<PublishedPost> {
    let access_token = config.linkedin_access_token()?;
    let company_id = config.linkedin_company_id()?;

    if post.body(language).trim().is_empty() {
        anyhow::bail!("No post content found for language '{}'", language.code());
    }

    let payload = build_share_payload(company_id, post, language);
    info!(
        "Publishing {} post to LinkedIn company page {}",
        language.name(),
        company_id
    );

    let response = client
        .post(format!("{}/v2/ugcPosts", config.linkedin_api_url))
        .bearer_auth(access_token)
        .header("X-Restli-Protocol-Version", "2.0.0")
        .header("LinkedIn-Version", &config.linkedin_api_version)
        .json(&payload)
        .send()
        .await
        .context("Failed to send request to LinkedIn API")?;

    if response.status() != reqwest::StatusCode::CREATED {
        return Err(anyhow::Error::new(
            HttpStatusError::from_response("LinkedIn", response).await,
        ));
    }

    let post_id = response
        .headers()
        .get("x-restli-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();

    info!("✓ {} post published: {}", language.name(), post_id);

    Ok(PublishedPost {
        language: language.code(),
        url: format!("https://www.linkedin.com/feed/update/{}", post_id),
        post_id,
    })
}

/// Publish each requested language in order; one failure does not stop the rest
pub async fn publish(
    client: &reqwest::Client,
    config: &Config,
    post: &LinkedInPost,
    target: PublishTarget,
) -> Vec<PublishOutcome> {
    let mut outcomes = Vec::new();
    for language in target.languages() {
        let result = publish_post(client, config, post, language).await;
        if let Err(e) = &result {
            warn!("✗ Failed to publish {} post: {:#}", language.name(), e);
        }
        outcomes.push(PublishOutcome { language, result });
    }
    outcomes
}

/// Publish the English and then the Spanish version
pub async fn publish_both(
    client: &reqwest::Client,
    config: &Config,
    post: &LinkedInPost,
) -> Vec<PublishOutcome> {
    publish(client, config, post, PublishTarget::Both).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use proptest::prelude::*;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn sample_post() -> LinkedInPost {
        LinkedInPost {
            title: "Reasoning model".to_string(),
            post_body_en: "A new reasoning model shipped. #AI".to_string(),
            post_body_es: "Se lanzó un nuevo modelo. #AI".to_string(),
            link: "https://example.com/model".to_string(),
        }
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = test_config();
        config.linkedin_api_url = server.uri();
        config
    }

    #[test]
    fn test_payload_with_link() {
        let payload = build_share_payload("12345", &sample_post(), Language::ENGLISH);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["author"], "urn:li:organization:12345");
        assert_eq!(json["lifecycleState"], "PUBLISHED");
        let share = &json["specificContent"]["com.linkedin.ugc.ShareContent"];
        assert_eq!(share["shareCommentary"]["text"], "A new reasoning model shipped. #AI");
        assert_eq!(share["shareMediaCategory"], "ARTICLE");
        assert_eq!(share["media"][0]["status"], "READY");
        assert_eq!(share["media"][0]["originalUrl"], "https://example.com/model");
        assert_eq!(share["media"][0]["title"]["text"], "Reasoning model");
        assert_eq!(
            json["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
            "PUBLIC"
        );
    }

    #[test]
    fn test_payload_without_link() {
        let mut post = sample_post();
        post.link = "N/A".to_string();
        let payload = build_share_payload("1", &post, Language::SPANISH);
        let json = serde_json::to_value(&payload).unwrap();

        let share = &json["specificContent"]["com.linkedin.ugc.ShareContent"];
        assert_eq!(share["shareMediaCategory"], "NONE");
        assert!(share.get("media").is_none());
        assert_eq!(share["shareCommentary"]["text"], "Se lanzó un nuevo modelo. #AI");
    }

    #[test]
    fn test_payload_long_description_truncated() {
        let mut post = sample_post();
        post.post_body_en = "é".repeat(250);
        let payload = build_share_payload("1", &post, Language::ENGLISH);
        let json = serde_json::to_value(&payload).unwrap();

        let description = json["specificContent"]["com.linkedin.ugc.ShareContent"]["media"][0]
            ["description"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(description.chars().count(), 203);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_payload_default_title() {
        let mut post = sample_post();
        post.title.clear();
        let payload = build_share_payload("1", &post, Language::ENGLISH);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json["specificContent"]["com.linkedin.ugc.ShareContent"]["media"][0]["title"]["text"],
            "AI News Update"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("ñandú", 2), "ña...");
    }

    #[test]
    fn test_publish_target_from_str() {
        assert_eq!("1".parse::<PublishTarget>().unwrap(), PublishTarget::English);
        assert_eq!("es".parse::<PublishTarget>().unwrap(), PublishTarget::Spanish);
        assert_eq!("Both".parse::<PublishTarget>().unwrap(), PublishTarget::Both);
        assert!("4".parse::<PublishTarget>().is_err());
        assert_eq!(PublishTarget::Both.languages().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_limit(text in "\\PC{0,400}", max in 0usize..300) {
            let out = truncate_chars(&text, max);
            let count = text.chars().count();
            if count <= max {
                prop_assert_eq!(out, text);
            } else {
                prop_assert_eq!(out.chars().count(), max + 3);
                prop_assert!(out.ends_with("..."));
            }
        }
    }

    #[tokio::test]
    async fn test_publish_post_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(header("Authorization", "Bearer test-linkedin-token"))
            .and(header("X-Restli-Protocol-Version", "2.0.0"))
            .and(body_partial_json(serde_json::json!({
                "author": "urn:li:organization:12345"
            })))
            .respond_with(
                ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:777"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let published = publish_post(&client, &config_for(&server), &sample_post(), Language::ENGLISH)
            .await
            .unwrap();

        assert_eq!(published.post_id, "urn:li:share:777");
        assert_eq!(
            published.url,
            "https://www.linkedin.com/feed/update/urn:li:share:777"
        );
        assert_eq!(published.language, "en");
    }

    #[tokio::test]
    async fn test_publish_post_missing_id_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let published = publish_post(&client, &config_for(&server), &sample_post(), Language::SPANISH)
            .await
            .unwrap();
        assert_eq!(published.post_id, "Unknown");
    }

    #[tokio::test]
    async fn test_publish_post_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = publish_post(&client, &config_for(&server), &sample_post(), Language::ENGLISH)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("LinkedIn API error (500): boom"));
    }

    #[tokio::test]
    async fn test_publish_post_empty_body_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut post = sample_post();
        post.post_body_en.clear();
        post.post_body_es.clear();

        let client = reqwest::Client::new();
        let err = publish_post(&client, &config_for(&server), &post, Language::ENGLISH)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No post content found"));
    }

    #[tokio::test]
    async fn test_publish_requires_credentials() {
        let mut config = test_config();
        config.linkedin_company_id = None;

        let client = reqwest::Client::new();
        let err = publish_post(&client, &config, &sample_post(), Language::ENGLISH)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("LINKEDIN_COMPANY_ID not set"));
    }

    #[tokio::test]
    async fn test_publish_both_reports_each_language() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(body_partial_json(serde_json::json!({
                "specificContent": {"com.linkedin.ugc.ShareContent": {
                    "shareCommentary": {"text": "A new reasoning model shipped. #AI"}
                }}
            })))
            .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "en-1"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(422).set_body_string("duplicate"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let outcomes = publish_both(&client, &config_for(&server), &sample_post()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].language, Language::ENGLISH);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[1].language, Language::SPANISH);
        assert!(!outcomes[1].is_success());
    }
}
