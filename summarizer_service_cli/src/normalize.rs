//! Whitespace collapsing and noise removal for raw article text.

use regex::Regex;
use std::sync::OnceLock;

/// How much cleanup [`normalize`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupMode {
    /// Collapse whitespace runs (newlines included) and trim.
    #[default]
    Basic,
    /// Basic cleanup plus URL, e-mail and stray markup removal, with
    /// canonical spacing around punctuation.
    Advanced,
}

impl CleanupMode {
    pub fn from_flag(advanced: bool) -> Self {
        if advanced {
            CleanupMode::Advanced
        } else {
            CleanupMode::Basic
        }
    }
}

/// Compiled patterns used by the normalizer.
pub struct TextNormalizer {
    whitespace: Regex,
    urls: Regex,
    emails: Regex,
    markup: Regex,
    space_before_punct: Regex,
    space_after_punct: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
            urls: Regex::new(r"https?\S+|www\S+").unwrap(),
            emails: Regex::new(r"\S+@\S+").unwrap(),
            markup: Regex::new(r"<[^>]*>").unwrap(),
            space_before_punct: Regex::new(r"\s+([.,!?:;])").unwrap(),
            space_after_punct: Regex::new(r"([.,!?:;])\s+").unwrap(),
        }
    }

    pub fn normalize(&self, text: &str, mode: CleanupMode) -> String {
        let basic = self.collapse(text);
        match mode {
            CleanupMode::Basic => basic,
            CleanupMode::Advanced => {
                let text = self.urls.replace_all(&basic, "");
                let text = self.emails.replace_all(&text, "");
                let text = self.markup.replace_all(&text, "");
                let text = self.space_before_punct.replace_all(&text, "$1");
                let text = self.space_after_punct.replace_all(&text, "$1 ");
                self.collapse(&text)
            }
        }
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

fn shared() -> &'static TextNormalizer {
    static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();
    NORMALIZER.get_or_init(TextNormalizer::new)
}

/// Normalizes `text` with the process-wide compiled patterns.
pub fn normalize(text: &str, mode: CleanupMode) -> String {
    shared().normalize(text, mode)
}
