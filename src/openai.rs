use crate::config::Config;
use crate::retry::{is_retryable_error, with_retry_if, HttpStatusError, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn build_request(config: &Config, system_prompt: &str, user_prompt: &str) -> ChatRequest {
    let messages = vec![
        Message {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        },
        Message {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        },
    ];

    if is_reasoning_model(&config.openai_model) {
        // Reasoning tokens count against the completion budget
        ChatRequest {
            model: config.openai_model.clone(),
            messages,
            max_tokens: None,
            max_completion_tokens: Some(config.post_max_tokens.max(16000)),
            temperature: None,
            reasoning_effort: Some("low".to_string()),
        }
    } else {
        ChatRequest {
            model: config.openai_model.clone(),
            messages,
            max_tokens: Some(config.post_max_tokens),
            max_completion_tokens: None,
            temperature: Some(0.7),
            reasoning_effort: None,
        }
    }
}

/// Send a system + user prompt to the chat completions endpoint and return
/// the first choice's content, trimmed.
pub async fn chat_completion(
    client: &reqwest::Client,
    config: &Config,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String> {
    let api_key = config.openai_api_key()?;
    let request = build_request(config, system_prompt, user_prompt);

    with_retry_if(
        &RetryConfig::api_call(),
        "OpenAI chat completion",
        || async {
            let response = client
                .post(&config.openai_api_url)
                .bearer_auth(api_key)
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
                .context("Failed to send request to OpenAI API")?;

            if !response.status().is_success() {
                return Err(anyhow::Error::new(
                    HttpStatusError::from_response("OpenAI", response).await,
                ));
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .context("Failed to parse OpenAI response")?;

            chat_response
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content.trim().to_string())
                .context("OpenAI response contained no choices")
        },
        is_retryable_error,
    )
    .await
}

/// Remove a surrounding markdown code fence (```json ... ```) if present.
///
/// Models often wrap JSON answers in fences even when told not to.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = test_config();
        config.openai_api_url = format!("{}/v1/chat/completions", server.uri());
        config
    }

    #[test]
    fn test_is_reasoning_model() {
        assert!(is_reasoning_model("gpt-5-mini"));
        assert!(is_reasoning_model("o1-preview"));
        assert!(is_reasoning_model("o4-mini"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
        assert!(!is_reasoning_model("gpt-4"));
    }

    #[test]
    fn test_standard_model_request_shape() {
        let config = test_config();
        let request = build_request(&config, "system", "user");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["max_tokens"], 1000);
        assert!(json.get("max_completion_tokens").is_none());
        assert!(json.get("reasoning_effort").is_none());
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "user");
    }

    #[test]
    fn test_reasoning_model_request_shape() {
        let mut config = test_config();
        config.openai_model = "o3-mini".to_string();
        let request = build_request(&config, "system", "user");
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_completion_tokens"], 16000);
        assert_eq!(json["reasoning_effort"], "low");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_chat_completion_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_openai_response("  Drafted post  ")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let content = chat_completion(&client, &config_for(&server), "sys", "usr")
            .await
            .expect("Should succeed");

        assert_eq!(content, "Drafted post");
    }

    #[tokio::test]
    async fn test_chat_completion_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = chat_completion(&client, &config_for(&server), "sys", "usr")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("OpenAI API error (401)"));
    }

    #[tokio::test]
    async fn test_chat_completion_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = chat_completion(&client, &config_for(&server), "sys", "usr")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_chat_completion_requires_api_key() {
        let mut config = test_config();
        config.openai_api_key = None;

        let client = reqwest::Client::new();
        let err = chat_completion(&client, &config, "sys", "usr")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("OPENAI_API_KEY not set"));
    }
}
