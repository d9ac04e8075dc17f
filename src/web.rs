use crate::config::Config;
use crate::language::Language;
use crate::linkedin::{self, PublishTarget};
use crate::pipeline::{self, PipelineError, Stage};
use crate::post::LinkedInPost;
use crate::security::verify_api_key;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const INDEX_HTML: &str = include_str!("../static/index.html");

const READY_MESSAGE: &str = "Ready to generate posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Ready,
    Generating,
    Success,
    Error,
}

/// What `/api/status` reports, plus the post from the last successful run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    pub message: String,
    pub progress: u8,
    #[serde(skip)]
    pub post: Option<LinkedInPost>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self {
            status: GenerationStatus::Ready,
            message: READY_MESSAGE.to_string(),
            progress: 0,
            post: None,
        }
    }
}

impl GenerationState {
    fn enter(&mut self, stage: Stage) {
        self.status = GenerationStatus::Generating;
        self.message = stage.message().to_string();
        self.progress = stage.progress();
    }

    fn fail(&mut self, message: String) {
        self.status = GenerationStatus::Error;
        self.message = message;
        self.progress = 0;
    }
}

pub struct AppState {
    pub config: Config,
    pub client: reqwest::Client,
    pub generation: RwLock<GenerationState>,
}

impl AppState {
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            generation: RwLock::new(GenerationState::default()),
        }
    }
}

/// Errors returned to the browser as `{"status": "error", "message": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Generation already in progress")]
    AlreadyGenerating,
    #[error("OpenAI API key not configured. Please set OPENAI_API_KEY in your .env file.")]
    OpenAiNotConfigured,
    #[error("LinkedIn credentials not configured. Set LINKEDIN_ACCESS_TOKEN and LINKEDIN_COMPANY_ID.")]
    LinkedInNotConfigured,
    #[error("No post data available")]
    NoPost,
    #[error("Invalid language specified")]
    InvalidLanguage,
    #[error("Invalid or missing API key")]
    Unauthorized,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoPost => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/generate", post(start_generation))
        .route("/api/status", get(status))
        .route("/api/post", get(current_post))
        .route("/api/clear", post(clear))
        .route("/api/copy/:language", post(copy_post))
        .route("/api/publish/:language", post(publish_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped
pub async fn serve(config: Config, client: reqwest::Client) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, client));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web UI listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn start_generation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    {
        let mut generation = state.generation.write().await;
        if generation.status == GenerationStatus::Generating {
            return Err(ApiError::AlreadyGenerating);
        }
        if state.config.openai_api_key.is_none() {
            return Err(ApiError::OpenAiNotConfigured);
        }

        generation.status = GenerationStatus::Generating;
        generation.message = "Starting generation...".to_string();
        generation.progress = 0;
    }

    tokio::spawn(run_generation(state));

    Ok(Json(json!({
        "status": "started",
        "message": "Generation started",
    })))
}

/// Background run: stage updates arrive over a channel so the pipeline
/// never holds the state lock.
async fn run_generation(state: Arc<AppState>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Stage>();

    let worker = {
        let state = state.clone();
        tokio::spawn(async move {
            pipeline::generate(&state.client, &state.config, move |stage| {
                // Fails only if the status loop has already stopped
                let _ = tx.send(stage);
            })
            .await
        })
    };

    while let Some(stage) = rx.recv().await {
        if stage != Stage::Done {
            state.generation.write().await.enter(stage);
        }
    }

    let mut generation = state.generation.write().await;
    match worker.await {
        Ok(Ok(post)) => {
            info!("Web generation finished");
            generation.status = GenerationStatus::Success;
            generation.message = Stage::Done.message().to_string();
            generation.progress = Stage::Done.progress();
            generation.post = Some(post);
        }
        Ok(Err(PipelineError::NoArticles)) => {
            generation.fail("No articles found. Please try again.".to_string());
        }
        Ok(Err(e)) => {
            error!("Web generation failed: {:#}", e);
            generation.fail(format!("Error: {}", e));
        }
        Err(e) => {
            error!("Generation task panicked: {}", e);
            generation.fail("Error: generation task stopped unexpectedly".to_string());
        }
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<GenerationState> {
    Json(state.generation.read().await.clone())
}

async fn current_post(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let generation = state.generation.read().await;
    let post = generation.post.as_ref().ok_or(ApiError::NoPost)?;
    Ok(Json(json!({
        "status": "success",
        "data": post,
    })))
}

async fn clear(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut generation = state.generation.write().await;
    if generation.status == GenerationStatus::Generating {
        return Err(ApiError::AlreadyGenerating);
    }
    *generation = GenerationState::default();

    Ok(Json(json!({
        "status": "success",
        "message": "Post data cleared",
    })))
}

async fn copy_post(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let generation = state.generation.read().await;
    let post = generation.post.as_ref().ok_or(ApiError::NoPost)?;
    let language = Language::from_code(&language).map_err(|_| ApiError::InvalidLanguage)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("{} post copied to clipboard", language.code().to_uppercase()),
        "content": post.body(language),
    })))
}

#[derive(Debug, Serialize)]
struct PublishResult {
    language: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn publish_post(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provided = headers.get("X-API-Key").and_then(|v| v.to_str().ok());
    if !verify_api_key(state.config.api_key.as_deref(), provided) {
        return Err(ApiError::Unauthorized);
    }

    let target: PublishTarget = language.parse().map_err(|_| ApiError::InvalidLanguage)?;
    if !state.config.can_publish() {
        return Err(ApiError::LinkedInNotConfigured);
    }

    // Clone so the lock is not held across the LinkedIn calls
    let post = state
        .generation
        .read()
        .await
        .post
        .clone()
        .ok_or(ApiError::NoPost)?;

    let outcomes = linkedin::publish(&state.client, &state.config, &post, target).await;
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();

    let results: Vec<PublishResult> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(published) => PublishResult {
                language: outcome.language.code(),
                post_id: Some(published.post_id),
                url: Some(published.url),
                error: None,
            },
            Err(e) => PublishResult {
                language: outcome.language.code(),
                post_id: None,
                url: None,
                error: Some(format!("{:#}", e)),
            },
        })
        .collect();

    let status = match succeeded {
        0 => "error",
        n if n == results.len() => "success",
        _ => "partial",
    };

    Ok(Json(json!({
        "status": status,
        "results": results,
    })))
}
