//! Turns semi-cleaned article markup into an ordered [`Document`].
//!
//! Only the top-level nodes of the markup are walked. Headings `h1`..`h3`
//! open sections; quotes, unordered lists and any other node become typed
//! content blocks of the section that is currently open.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use std::mem;
use tracing::{debug, warn};

use crate::normalize::{normalize, CleanupMode};
use crate::{ContentBlock, Document, Error, Result, Section};

/// What a top-level node contributes to the document.
enum TopLevel {
    Heading(String),
    Block(ContentBlock),
    Skip,
}

/// Accumulates sections in order of first appearance.
struct SectionBuilder {
    sections: Vec<Section>,
    current: Section,
}

impl SectionBuilder {
    fn new() -> Self {
        Self {
            sections: Vec::new(),
            current: Section::new(None),
        }
    }

    fn open(&mut self, header: String) {
        self.flush();
        self.current.header = Some(header);
    }

    fn push(&mut self, block: ContentBlock) {
        self.current.content.push(block);
    }

    /// Closes the open section; sections without content are dropped.
    fn flush(&mut self) {
        let header = self.current.header.clone();
        let closed = mem::replace(&mut self.current, Section::new(header));
        if closed.has_content() {
            self.sections.push(closed);
        }
    }

    fn finish(mut self) -> Document {
        self.flush();
        Document::new(self.sections)
    }
}

/// Parses `markup` into a document, failing only when there is no markup at all.
pub fn parse(markup: &str) -> Result<Document> {
    if markup.trim().is_empty() {
        return Err(Error::StructureParseFailure("empty markup".into()));
    }

    let fragment = Html::parse_fragment(markup);
    let mut builder = SectionBuilder::new();

    for child in fragment.root_element().children() {
        match classify(child) {
            TopLevel::Heading(text) => builder.open(text),
            TopLevel::Block(block) => builder.push(block),
            TopLevel::Skip => {}
        }
    }

    let document = builder.finish();
    debug!(sections = document.len(), "structured document");
    Ok(document)
}

/// Like [`parse`], but degrades to an empty document instead of failing.
pub fn structure(markup: &str) -> Document {
    parse(markup).unwrap_or_else(|e| {
        warn!("{}, using an empty document", e);
        Document::default()
    })
}

fn classify(node: NodeRef<'_, Node>) -> TopLevel {
    match node.value() {
        Node::Text(_) => paragraph(node),
        Node::Element(el) => match el.name() {
            "h1" | "h2" | "h3" => TopLevel::Heading(visible_text(node)),
            "blockquote" => quote(node),
            "ul" => list(node),
            "br" | "b" => TopLevel::Skip,
            _ => paragraph(node),
        },
        _ => TopLevel::Skip,
    }
}

fn paragraph(node: NodeRef<'_, Node>) -> TopLevel {
    let text = visible_text(node);
    if text.is_empty() {
        TopLevel::Skip
    } else {
        TopLevel::Block(ContentBlock::Paragraph { text })
    }
}

/// Each `<br>` inside the quote ends one part.
fn quote(node: NodeRef<'_, Node>) -> TopLevel {
    let mut parts = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for child in node.children() {
        if is_element(child, "br") {
            if !current.is_empty() {
                parts.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        let text = visible_text(child);
        if !text.is_empty() {
            current.push(text);
        }
    }
    if !current.is_empty() {
        parts.push(current.join(" "));
    }

    if parts.is_empty() {
        TopLevel::Skip
    } else {
        TopLevel::Block(ContentBlock::Quote { parts })
    }
}

/// Collects the direct `<li>` children only.
fn list(node: NodeRef<'_, Node>) -> TopLevel {
    let items: Vec<String> = node
        .children()
        .filter(|child| is_element(*child, "li"))
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect();

    if items.is_empty() {
        TopLevel::Skip
    } else {
        TopLevel::Block(ContentBlock::List { items })
    }
}

fn is_element(node: NodeRef<'_, Node>, name: &str) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == name)
}

/// Text of a node and all its descendants, whitespace collapsed.
fn visible_text(node: NodeRef<'_, Node>) -> String {
    let raw = match node.value() {
        Node::Text(text) => text.to_string(),
        Node::Element(_) => ElementRef::wrap(node)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default(),
        _ => String::new(),
    };
    normalize(&raw, CleanupMode::Basic)
}
