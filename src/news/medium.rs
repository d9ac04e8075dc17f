use super::{fetch_body, Article};
use crate::config::Config;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::info;

const MEDIUM_BASE_URL: &str = "https://medium.com";

/// Scrape article cards from a Medium tag page
pub async fn fetch_from_medium(client: &reqwest::Client, config: &Config) -> Result<Vec<Article>> {
    info!("Scraping Medium tag page {}", config.medium_tag_url);
    let body = fetch_body(client, "Medium", &config.medium_tag_url, &[]).await?;
    parse_medium_page(&body)
}

/// Parse the tag page HTML. Kept synchronous: `scraper::Html` is not `Send`
/// and must not live across an await point.
fn parse_medium_page(html: &str) -> Result<Vec<Article>> {
    let document = Html::parse_document(html);
    let article_sel = selector("article")?;
    let title_sel = selector("h2")?;
    let subtitle_sel = selector("h3")?;
    let paragraph_sel = selector("p")?;
    let link_sel = selector("a[href]")?;

    let articles = document
        .select(&article_sel)
        .filter_map(|card| {
            let title = element_text(card.select(&title_sel).next()?);
            let usable = |s: &String| !s.is_empty() && *s != title;
            // The subtitle wins over paragraphs, which may hold the author byline
            let summary = card
                .select(&subtitle_sel)
                .map(element_text)
                .find(usable)
                .or_else(|| card.select(&paragraph_sel).map(element_text).find(usable))?;
            let href = card
                .select(&link_sel)
                .filter_map(|a| a.value().attr("href"))
                .find(|h| is_story_link(h))?;

            if title.is_empty() {
                return None;
            }

            Some(Article {
                title,
                summary,
                url: absolute_url(href),
                source: "Medium".to_string(),
            })
        })
        .collect();

    Ok(articles)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cards also link to the author profile (`/@name`) and to tags
fn is_story_link(href: &str) -> bool {
    let path = href.split('?').next().unwrap_or(href);
    if path.starts_with("/tag/") {
        return false;
    }
    match path.strip_prefix("/@") {
        Some(rest) => rest.contains('/'),
        None => true,
    }
}

/// Make a Medium link absolute and drop tracking query parameters
fn absolute_url(href: &str) -> String {
    let without_query = href.split('?').next().unwrap_or(href);
    if without_query.starts_with("http://") || without_query.starts_with("https://") {
        without_query.to_string()
    } else if without_query.starts_with('/') {
        format!("{}{}", MEDIUM_BASE_URL, without_query)
    } else {
        format!("{}/{}", MEDIUM_BASE_URL, without_query)
    }
}
