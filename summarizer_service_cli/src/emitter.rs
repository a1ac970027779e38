//! Section-by-section summarization delivered as an ordered event stream.
//!
//! The stream is lazy: a section is only reduced when the consumer polls for
//! its result. Between sections the emitter yields to the scheduler and
//! checks whether the consumer has gone away. A run that is not cancelled
//! always ends with exactly one `Complete` or `Error` event.

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai::SummarizationOracle;
use crate::config::SummarizerConfig;
use crate::normalize::{normalize, CleanupMode};
use crate::reducer::{reduce, ReduceParams};
use crate::{Document, Result, Section};

/// One frame of the progress protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Metadata {
        title: String,
    },
    Start {
        total_sections: usize,
    },
    Processing {
        section_index: usize,
        header: Option<String>,
    },
    SectionComplete {
        section_index: usize,
        section: Section,
    },
    Complete {
        result: Document,
    },
    Error {
        message: String,
    },
}

impl StreamEvent {
    /// `Complete` and `Error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The event as one newline-terminated JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = self.to_json()?;
        line.push('\n');
        Ok(line)
    }
}

/// Shared flag a transport sets when its consumer disconnects.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Text handed to the reducer for one section.
pub fn section_text(section: &Section, cleanup: CleanupMode) -> String {
    normalize(&section.flatten_text(), cleanup)
}

#[derive(Debug)]
enum Phase {
    Metadata,
    Start,
    Section(usize),
    Reduce(usize, String),
    Done,
}

/// Walks a document's sections in order and reduces each one.
pub struct Emitter<O: ?Sized> {
    document: Document,
    title: Option<String>,
    oracle: Arc<O>,
    params: ReduceParams,
    cleanup: CleanupMode,
    cancellation: Cancellation,
    phase: Phase,
}

impl<O> Emitter<O>
where
    O: SummarizationOracle + ?Sized + 'static,
{
    pub fn new(document: Document, oracle: Arc<O>, config: &SummarizerConfig) -> Self {
        Self {
            document,
            title: None,
            oracle,
            params: ReduceParams::from(config),
            cleanup: CleanupMode::from_flag(config.advanced_cleanup),
            cancellation: Cancellation::new(),
            phase: Phase::Metadata,
        }
    }

    /// Emits a `Metadata` event ahead of `Start`.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        stream::unfold(self, |mut emitter| async move {
            let event = emitter.next_event().await?;
            Some((event, emitter))
        })
    }

    fn disconnected(&mut self) -> bool {
        if self.cancellation.is_cancelled() {
            info!("consumer disconnected, stopping");
            self.phase = Phase::Done;
            return true;
        }
        false
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            match mem::replace(&mut self.phase, Phase::Done) {
                Phase::Metadata => {
                    self.phase = Phase::Start;
                    if let Some(title) = self.title.take() {
                        return Some(StreamEvent::Metadata { title });
                    }
                }
                Phase::Start => {
                    self.phase = Phase::Section(0);
                    return Some(StreamEvent::Start {
                        total_sections: self.document.len(),
                    });
                }
                Phase::Section(index) => return self.begin_section(index).await,
                Phase::Reduce(index, text) => return self.finish_section(index, text).await,
                Phase::Done => return None,
            }
        }
    }

    async fn begin_section(&mut self, index: usize) -> Option<StreamEvent> {
        if index > 0 {
            tokio::task::yield_now().await;
        }
        if self.disconnected() {
            return None;
        }
        if index >= self.document.len() {
            info!(sections = self.document.len(), "document complete");
            return Some(StreamEvent::Complete {
                result: self.document.clone(),
            });
        }

        let section = &mut self.document.sections[index];
        let text = section_text(section, self.cleanup);
        if text.is_empty() {
            debug!(index, "section has no text, skipping reduction");
            section.content.clear();
            let section = section.clone();
            self.phase = Phase::Section(index + 1);
            return Some(StreamEvent::SectionComplete {
                section_index: index,
                section,
            });
        }

        let header = section.header.clone();
        self.phase = Phase::Reduce(index, text);
        Some(StreamEvent::Processing {
            section_index: index,
            header,
        })
    }

    async fn finish_section(&mut self, index: usize, text: String) -> Option<StreamEvent> {
        if self.disconnected() {
            return None;
        }
        match reduce(&text, self.oracle.as_ref(), self.params).await {
            Ok(summary) => {
                let updated = self.document.sections[index].with_summary(summary);
                self.document.sections[index] = updated.clone();
                info!(index, "section complete");
                self.phase = Phase::Section(index + 1);
                Some(StreamEvent::SectionComplete {
                    section_index: index,
                    section: updated,
                })
            }
            Err(e) => {
                warn!(index, "section failed: {}", e);
                Some(StreamEvent::Error {
                    message: e.to_string(),
                })
            }
        }
    }
}
