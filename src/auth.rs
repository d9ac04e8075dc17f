use crate::config::Config;
use crate::retry::{is_retryable_error, with_retry_if, HttpStatusError, RetryConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

/// Permissions needed to post on behalf of a company page
pub const OAUTH_SCOPES: &str = "w_member_social r_organization_social w_organization_social";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub localized_first_name: String,
    #[serde(default)]
    pub localized_last_name: String,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.localized_first_name, self.localized_last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct AclResponse {
    #[serde(default)]
    elements: Vec<AclElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AclElement {
    #[serde(default)]
    organizational_target: String,
}

/// Opaque value echoed back by LinkedIn on the callback
pub fn new_state() -> String {
    format!("lnp{:x}", Utc::now().timestamp_micros())
}

/// URL the user opens to grant the app access
pub fn authorization_url(config: &Config, state: &str) -> Result<String> {
    let client_id = config
        .linkedin_client_id
        .as_deref()
        .context("LINKEDIN_CLIENT_ID not set")?;

    let url = Url::parse_with_params(
        &format!("{}/authorization", config.linkedin_oauth_url),
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", config.linkedin_redirect_uri.as_str()),
            ("state", state),
            ("scope", OAUTH_SCOPES),
        ],
    )
    .context("Invalid LINKEDIN_OAUTH_URL")?;

    Ok(url.to_string())
}

/// Accept either the bare authorization code or the whole callback URL.
///
/// When `expected_state` is given and the URL carries a different state,
/// the code is rejected.
pub fn extract_authorization_code(input: &str, expected_state: Option<&str>) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("No authorization code provided");
    }

    if !input.contains("://") {
        return Ok(input.to_string());
    }

    let url = Url::parse(input).context("Could not parse callback URL")?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => anyhow::bail!("LinkedIn denied authorization: {}", value),
            _ => {}
        }
    }

    if let (Some(expected), Some(actual)) = (expected_state, state.as_deref()) {
        if expected != actual {
            anyhow::bail!("OAuth state mismatch: the callback does not belong to this session");
        }
    }

    code.filter(|c| !c.is_empty())
        .context("Callback URL has no 'code' parameter")
}

/// Trade the authorization code for an access token
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<TokenResponse> {
    let client_id = config
        .linkedin_client_id
        .as_deref()
        .context("LINKEDIN_CLIENT_ID not set")?;
    let client_secret = config
        .linkedin_client_secret
        .as_deref()
        .context("LINKEDIN_CLIENT_SECRET not set")?;

    info!("Exchanging authorization code for an access token");
    let response = client
        .post(format!("{}/accessToken", config.linkedin_oauth_url))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.linkedin_redirect_uri.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await
        .context("Failed to reach LinkedIn OAuth endpoint")?;

    // Codes are single use, so a failed exchange is never retried
    if !response.status().is_success() {
        return Err(anyhow::Error::new(
            HttpStatusError::from_response("LinkedIn OAuth", response).await,
        ));
    }

    response
        .json::<TokenResponse>()
        .await
        .context("Failed to parse LinkedIn token response")
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    config: &Config,
    access_token: &str,
    path_and_query: &str,
) -> Result<T> {
    let url = format!("{}{}", config.linkedin_api_url, path_and_query);
    debug!("GET {}", url);

    with_retry_if(
        &RetryConfig::api_call(),
        "LinkedIn",
        || async {
            let response = client
                .get(&url)
                .bearer_auth(access_token)
                .header("X-Restli-Protocol-Version", "2.0.0")
                .send()
                .await
                .context("Failed to send request to LinkedIn API")?;

            if !response.status().is_success() {
                return Err(anyhow::Error::new(
                    HttpStatusError::from_response("LinkedIn", response).await,
                ));
            }

            response
                .json::<T>()
                .await
                .context("Failed to parse LinkedIn response")
        },
        is_retryable_error,
    )
    .await
}

/// Profile of the member who granted the token
pub async fn fetch_profile(
    client: &reqwest::Client,
    config: &Config,
    access_token: &str,
) -> Result<Profile> {
    get_json(client, config, access_token, "/v2/me").await
}

/// Ids of the organizations the member administers
pub async fn fetch_admin_organizations(
    client: &reqwest::Client,
    config: &Config,
    access_token: &str,
) -> Result<Vec<String>> {
    let acls: AclResponse = get_json(
        client,
        config,
        access_token,
        "/v2/organizationalEntityAcls?q=roleAssignee&role=ADMINISTRATOR",
    )
    .await?;

    Ok(acls
        .elements
        .iter()
        .filter_map(|e| organization_id(&e.organizational_target))
        .collect())
}

/// `urn:li:organization:123` -> `123`
fn organization_id(urn: &str) -> Option<String> {
    let id = urn.rsplit(':').next()?;
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
