//! Terminal renderings. Everything here returns a `String` so the binaries
//! only have to print it.

use crate::language::Language;
use crate::linkedin::PublishOutcome;
use crate::post::LinkedInPost;

/// LinkedIn page where the user pastes a manual post
pub const LINKEDIN_FEED_URL: &str = "https://www.linkedin.com/feed/";

const RULE: &str = "════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "────────────────────────────────────────────────────────────";

fn banner(title: &str) -> Vec<String> {
    vec![
        format!("╔{}╗", RULE),
        format!("║ {:<58} ║", title),
        format!("╚{}╝", RULE),
    ]
}

/// Summary printed after `generate`
pub fn render_generated_post(post: &LinkedInPost, saved_to: &str) -> String {
    let mut lines = banner("GENERATED LINKEDIN POST");
    lines.push(format!("📰 Title: {}", post.display_title()));
    lines.push(format!(
        "🔗 Link:  {}",
        if post.has_link() { post.link.trim() } else { "N/A" }
    ));

    for language in Language::all() {
        lines.push(String::new());
        lines.push(format!("{} {} version:", language.flag(), language.name()));
        lines.push(THIN_RULE.to_string());
        lines.push(post.body(language).trim().to_string());
        lines.push(THIN_RULE.to_string());
    }

    lines.push(String::new());
    lines.push(format!("💾 Saved to: {}", saved_to));
    lines.join("\n")
}

/// Both paste-ready versions plus how to publish them by hand
pub fn render_manual_view(post: &LinkedInPost) -> String {
    let mut lines = banner("MANUAL LINKEDIN POSTING");

    for language in Language::all() {
        lines.push(String::new());
        lines.push(format!(
            "{} {} ({}):",
            language.flag(),
            language.name(),
            language.native_name()
        ));
        lines.push(THIN_RULE.to_string());
        lines.push(post.format_for_manual(language));
        lines.push(THIN_RULE.to_string());
    }

    lines.push(String::new());
    lines.push("How to post:".to_string());
    lines.push(format!("  1. Open {}", LINKEDIN_FEED_URL));
    lines.push("  2. Switch to your company page and click \"Start a post\"".to_string());
    lines.push("  3. Paste one of the versions above and publish".to_string());
    lines.join("\n")
}

/// One line per language attempted, then a tally
pub fn render_publish_results(outcomes: &[PublishOutcome]) -> String {
    let mut lines = Vec::new();

    for outcome in outcomes {
        match &outcome.result {
            Ok(published) => lines.push(format!(
                "✅ {} post published: {}",
                outcome.language.name(),
                published.url
            )),
            Err(e) => lines.push(format!(
                "❌ {} post failed: {:#}",
                outcome.language.name(),
                e
            )),
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    lines.push(format!(
        "📊 {}/{} posts published",
        succeeded,
        outcomes.len()
    ));
    lines.join("\n")
}
