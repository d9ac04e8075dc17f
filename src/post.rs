use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Title used when the model or the saved file does not provide one
pub const DEFAULT_TITLE: &str = "AI News Update";

/// A bilingual LinkedIn post as produced by the generator and stored on disk.
///
/// Field names match the JSON contract with the model and the saved
/// `linkedin_post.json` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub post_body_en: String,
    #[serde(default)]
    pub post_body_es: String,
    #[serde(default)]
    pub link: String,
}

/// Why a saved post could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum PostFileError {
    #[error("{} not found. Run `generate` first to create a post.", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Error accessing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LinkedInPost {
    /// Body text for a language. Spanish falls back to English when missing.
    pub fn body(&self, language: Language) -> &str {
        if language == Language::SPANISH && !self.post_body_es.is_empty() {
            &self.post_body_es
        } else {
            &self.post_body_en
        }
    }

    pub fn has_link(&self) -> bool {
        let link = self.link.trim();
        !link.is_empty() && link != "N/A"
    }

    /// Title, or the default when empty
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            &self.title
        }
    }

    /// Text ready to paste into LinkedIn's composer: body plus the article link.
    pub fn format_for_manual(&self, language: Language) -> String {
        let body = self.body(language).trim();
        if body.is_empty() {
            return "No post content available".to_string();
        }

        let mut formatted = body.to_string();
        if self.has_link() {
            formatted.push_str("\n\n");
            formatted.push_str(self.link.trim());
        }
        formatted
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PostFileError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PostFileError::NotFound(path.to_path_buf())
            } else {
                PostFileError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        serde_json::from_str(&contents).map_err(|e| PostFileError::InvalidJson {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write as pretty-printed UTF-8 JSON (accents and emoji kept as-is)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PostFileError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| PostFileError::InvalidJson {
            path: path.to_path_buf(),
            source: e,
        })?;

        std::fs::write(path, json).map_err(|e| PostFileError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!("Post saved to {}", path.display());
        Ok(())
    }

    /// Write the paste-ready text to `linkedin_post_<code>.txt` inside `dir`
    pub fn save_manual_copy(
        &self,
        dir: impl AsRef<Path>,
        language: Language,
    ) -> Result<PathBuf, PostFileError> {
        let path = dir
            .as_ref()
            .join(format!("linkedin_post_{}.txt", language.code()));

        std::fs::write(&path, self.format_for_manual(language)).map_err(|e| {
            PostFileError::Io {
                path: path.clone(),
                source: e,
            }
        })?;

        info!("{} post saved to {}", language.name(), path.display());
        Ok(path)
    }
}
