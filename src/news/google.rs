use super::{fetch_body, Article};
use crate::config::Config;
use anyhow::{Context, Result};
use scraper::Html;
use tracing::info;

/// Fetch AI headlines from the Google News RSS search feed
pub async fn fetch_from_google_news(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Vec<Article>> {
    info!("Fetching Google News RSS");
    let body = fetch_body(client, "Google News", &config.google_news_rss_url, &[]).await?;

    // Some proxies answer with an HTML error page and a 200
    let head = body.trim_start();
    if head.starts_with("<!DOCTYPE") || head.starts_with("<html") {
        anyhow::bail!("Google News returned HTML instead of RSS");
    }

    let channel =
        rss::Channel::read_from(body.as_bytes()).context("Failed to parse Google News RSS")?;

    Ok(channel.items().iter().filter_map(rss_item_to_article).collect())
}

fn rss_item_to_article(item: &rss::Item) -> Option<Article> {
    let title = item.title()?.trim();
    let summary = html_to_text(item.description()?);
    if title.is_empty() || summary.is_empty() {
        return None;
    }

    Some(Article {
        title: title.to_string(),
        summary,
        url: item.link().unwrap_or_default().to_string(),
        source: item
            .source()
            .and_then(|s| s.title())
            .unwrap_or("Google News")
            .to_string(),
    })
}

/// Google News descriptions are HTML fragments (`<a>Title</a>&nbsp;<font>Source</font>`)
pub(crate) fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
