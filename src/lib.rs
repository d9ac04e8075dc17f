pub mod auth;
pub mod cli;
pub mod config;
pub mod display;
pub mod envfile;
pub mod generator;
pub mod language;
pub mod linkedin;
pub mod news;
pub mod openai;
pub mod pipeline;
pub mod post;
pub mod retry;
pub mod security;
pub mod validator;
pub mod web;

use std::time::Duration;

/// Some news sites refuse requests without a browser user agent
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP client shared by every call in a run
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .build()?;
    Ok(client)
}
