//! Markup in, summarized document out.

use futures::stream::Stream;
use std::sync::Arc;
use tracing::info;

use crate::ai::SummarizationOracle;
use crate::config::SummarizerConfig;
use crate::emitter::{section_text, Cancellation, Emitter, StreamEvent};
use crate::normalize::{normalize, CleanupMode};
use crate::reducer::{reduce, ReduceParams};
use crate::structure::structure;
use crate::{Document, Result};

/// Cleans and structures raw article markup.
pub fn prepare(markup: &str) -> Document {
    let cleaned = normalize(markup, CleanupMode::Basic);
    let document = structure(&cleaned);
    info!(sections = document.len(), "article structured");
    document
}

/// Streams the summarization of `markup`, section by section.
pub fn process_article<O>(
    markup: &str,
    title: Option<String>,
    oracle: Arc<O>,
    config: &SummarizerConfig,
    cancellation: Cancellation,
) -> impl Stream<Item = StreamEvent> + Send
where
    O: SummarizationOracle + ?Sized + 'static,
{
    let mut emitter = Emitter::new(prepare(markup), oracle, config).with_cancellation(cancellation);
    if let Some(title) = title {
        emitter = emitter.with_title(title);
    }
    emitter.into_stream()
}

/// Summarizes every section and returns the finished document.
///
/// The first failing section aborts the whole run.
pub async fn summarize_document<O>(mut document: Document, oracle: &O, config: &SummarizerConfig) -> Result<Document>
where
    O: SummarizationOracle + ?Sized,
{
    let params = ReduceParams::from(config);
    let cleanup = CleanupMode::from_flag(config.advanced_cleanup);

    for section in document.sections.iter_mut() {
        let text = section_text(section, cleanup);
        if text.is_empty() {
            section.content.clear();
            continue;
        }
        let summary = reduce(&text, oracle, params).await?;
        *section = section.with_summary(summary);
    }
    Ok(document)
}
