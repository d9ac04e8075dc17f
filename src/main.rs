use anyhow::Result;
use clap::Parser;
use linkedin_news_poster::cli::{self, Cli};
use linkedin_news_poster::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (absent in CI)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linkedin_news_poster=info".parse()?),
        )
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let client = linkedin_news_poster::build_http_client()?;

    info!("Running {:?}", args.command);
    cli::execute(args.command, config, client).await
}
