//! Post languages.
//!
//! Every post is drafted in English (the canonical language) and Spanish.
//! `Language` is a small validated handle onto a static table, so adding a
//! language means adding one row here and one body field on the post.

use anyhow::{bail, Result};
use std::fmt;

#[derive(Debug)]
struct LanguageInfo {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    flag: &'static str,
    is_canonical: bool,
}

static LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        code: "en",
        name: "English",
        native_name: "English",
        flag: "🇺🇸",
        is_canonical: true,
    },
    LanguageInfo {
        code: "es",
        name: "Spanish",
        native_name: "Español",
        flag: "🇪🇸",
        is_canonical: false,
    },
];

/// A supported post language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 code, always one of the codes in `LANGUAGES`
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const SPANISH: Language = Language { code: "es" };

    /// Look up a language by ISO 639-1 code (case-insensitive).
    ///
    /// # Returns
    /// * `Ok(Language)` for `en` or `es`
    /// * `Err` for anything else
    pub fn from_code(code: &str) -> Result<Language> {
        let normalized = code.trim().to_ascii_lowercase();
        match LANGUAGES.iter().find(|l| l.code == normalized) {
            Some(info) => Ok(Language { code: info.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// All languages in publishing order (canonical first)
    pub fn all() -> [Language; 2] {
        [Language::ENGLISH, Language::SPANISH]
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn native_name(&self) -> &'static str {
        self.info().native_name
    }

    pub fn flag(&self) -> &'static str {
        self.info().flag
    }

    pub fn is_canonical(&self) -> bool {
        self.info().is_canonical
    }

    fn info(&self) -> &'static LanguageInfo {
        LANGUAGES
            .iter()
            .find(|l| l.code == self.code)
            .expect("Language code should always be valid")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_code(s)
    }
}
