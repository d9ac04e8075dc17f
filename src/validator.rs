//! Quality checks for generated posts.
//!
//! The model is asked for two localized versions of the same post. These
//! checks catch the common failure modes: an empty version, a version over
//! the word budget, and hashtags or URLs that were dropped or altered in
//! the Spanish adaptation.

use crate::post::LinkedInPost;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Word budget per language
pub const MAX_WORDS_PER_LANGUAGE: usize = 120;

/// Validation report containing errors and warnings about a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make the post unusable as-is
    pub errors: Vec<String>,

    /// Problems worth a look before publishing
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub struct PostValidator;

static HASHTAG_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

impl PostValidator {
    pub fn validate(post: &LinkedInPost) -> ValidationReport {
        let mut report = ValidationReport::default();

        let en = post.post_body_en.trim();
        let es = post.post_body_es.trim();

        if en.is_empty() {
            report.errors.push("English version is empty".to_string());
        }
        if es.is_empty() {
            report.errors.push("Spanish version is empty".to_string());
        }

        for (label, body) in [("English", en), ("Spanish", es)] {
            let words = word_count(body);
            if words > MAX_WORDS_PER_LANGUAGE {
                report.warnings.push(format!(
                    "{} version has {} words (limit {})",
                    label, words, MAX_WORDS_PER_LANGUAGE
                ));
            }
        }

        // Cross-language checks only make sense when both versions exist
        if en.is_empty() || es.is_empty() {
            return report;
        }

        let en_tags = Self::extract_hashtags(en);
        let es_tags = Self::extract_hashtags(es);
        if en_tags != es_tags {
            report.warnings.push(format!(
                "Hashtag mismatch: English has {:?}, Spanish has {:?}",
                en_tags, es_tags
            ));
        }

        let en_urls = Self::extract_urls(en);
        let es_urls = Self::extract_urls(es);
        if en_urls != es_urls {
            report.warnings.push(format!(
                "URL mismatch: English has {} URLs, Spanish has {} URLs",
                en_urls.len(),
                es_urls.len()
            ));
        }

        report
    }

    /// Hashtags, case-folded, as a set (order may differ between languages)
    fn extract_hashtags(text: &str) -> BTreeSet<String> {
        let regex = HASHTAG_REGEX.get_or_init(|| Regex::new(r"#(\w+)").unwrap());

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_lowercase()))
            .collect()
    }

    fn extract_urls(text: &str) -> BTreeSet<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(['.', ',']).to_string())
            .collect()
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
