use crate::config::Config;
use crate::generator::generate_post;
use crate::news::fetch_latest_news;
use crate::post::LinkedInPost;
use std::fmt;
use tracing::{error, info};

/// Steps of a generation run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingNews,
    GeneratingPost,
    Done,
}

impl Stage {
    /// Completion percentage shown by the web UI
    pub fn progress(&self) -> u8 {
        match self {
            Stage::FetchingNews => 25,
            Stage::GeneratingPost => 75,
            Stage::Done => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Stage::FetchingNews => "Fetching AI news...",
            Stage::GeneratingPost => "Generating post with OpenAI...",
            Stage::Done => "Post generated successfully!",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No articles found from any news source")]
    NoArticles,
    #[error("Post generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

/// Fetch news, draft the bilingual post and save it to `POST_FILE`.
///
/// `progress` is called on entering each stage. A failed save is logged and
/// the generated post is still returned.
pub async fn generate<P>(
    client: &reqwest::Client,
    config: &Config,
    progress: P,
) -> Result<LinkedInPost, PipelineError>
where
    P: Fn(Stage),
{
    progress(Stage::FetchingNews);
    let articles = fetch_latest_news(client, config).await;
    if articles.is_empty() {
        error!("No articles found from any news source");
        return Err(PipelineError::NoArticles);
    }
    info!("Using {} articles", articles.len());

    progress(Stage::GeneratingPost);
    let post = generate_post(client, config, &articles)
        .await
        .map_err(PipelineError::Generation)?;

    if let Err(e) = post.save(&config.post_file) {
        error!("Failed to save post to {}: {}", config.post_file, e);
    }

    progress(Stage::Done);
    Ok(post)
}
