pub mod ai;
pub mod chunker;
pub mod config;
pub mod emitter;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reducer;
pub mod scraper;
pub mod sentiment;
pub mod structure;
pub mod utils;

pub use error::{Error, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article split into ordered sections. Order is significant.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Document {
    pub sections: Vec<Section>,
}

/// A titled or untitled span of a document. `header` is `None` for text
/// that appears before the first heading.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Section {
    pub header: Option<String>,
    pub content: Vec<ContentBlock>,
}

/// Typed leaf content of a section. Blocks never nest.
///
/// On the wire a paragraph is a plain string and a list or quote is an array
/// of strings, which is what the browser client renders. Arrays read back as
/// lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Paragraph { text: String },
    List { items: Vec<String> },
    Quote { parts: Vec<String> },
}

impl Document {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Section {
    pub fn new(header: Option<String>) -> Self {
        Self {
            header,
            content: Vec::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Joins every block's text with single spaces, in block order.
    pub fn flatten_text(&self) -> String {
        join_non_empty(self.content.iter().map(ContentBlock::flatten))
    }

    /// Returns a copy whose content is replaced wholesale by one paragraph.
    pub fn with_summary(&self, summary: String) -> Self {
        Self {
            header: self.header.clone(),
            content: vec![ContentBlock::Paragraph { text: summary }],
        }
    }
}

impl ContentBlock {
    pub fn flatten(&self) -> String {
        match self {
            ContentBlock::Paragraph { text } => text.trim().to_string(),
            ContentBlock::List { items } => join_non_empty(items.iter().map(|i| i.trim().to_string())),
            ContentBlock::Quote { parts } => join_non_empty(parts.iter().map(|p| p.trim().to_string())),
        }
    }
}

impl Serialize for ContentBlock {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ContentBlock::Paragraph { text } => serializer.serialize_str(text),
            ContentBlock::List { items } => items.serialize(serializer),
            ContentBlock::Quote { parts } => parts.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBlock {
    Text(String),
    Lines(Vec<String>),
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match WireBlock::deserialize(deserializer)? {
            WireBlock::Text(text) => ContentBlock::Paragraph { text },
            WireBlock::Lines(items) => ContentBlock::List { items },
        })
    }
}

fn join_non_empty(parts: impl Iterator<Item = String>) -> String {
    parts.filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

/// A reader comment attached to an article.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            text: Some(text.into()),
        }
    }
}

/// An article as delivered by the retrieval collaborator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time: Option<String>,
    pub views: Option<String>,
    /// Pre-filtered markup of the article body.
    pub body_markup: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub author_comments: Vec<Comment>,
}

impl Article {
    pub fn new(url: String, title: String) -> Self {
        Self {
            url,
            title,
            author: None,
            published_at: None,
            reading_time: None,
            views: None,
            body_markup: String::new(),
            images: Vec::new(),
            tags: Vec::new(),
            comments: Vec::new(),
            author_comments: Vec::new(),
        }
    }
}
