//! End-to-end tests of structuring, reduction and event streaming.

mod common;

use common::{FailsAfter, Identity, Shrinking};
use futures::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use summarizer_service_cli::ai::LengthBounds;
use summarizer_service_cli::config::SummarizerConfig;
use summarizer_service_cli::emitter::{Cancellation, Emitter, StreamEvent};
use summarizer_service_cli::pipeline::process_article;
use summarizer_service_cli::reducer::{reduce, ReduceParams};
use summarizer_service_cli::{ContentBlock, Document, Error, Section};

fn config(chunk_budget: usize) -> SummarizerConfig {
    SummarizerConfig {
        chunk_budget,
        min_output_len: 2,
        max_output_len: 5,
        ..SummarizerConfig::default()
    }
}

fn paragraph(text: &str) -> ContentBlock {
    ContentBlock::Paragraph { text: text.into() }
}

fn section(header: &str, text: &str) -> Section {
    Section {
        header: Some(header.into()),
        content: vec![paragraph(text)],
    }
}

fn long_text(sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("sentence number {} ends here.", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn indices(events: &[StreamEvent]) -> (Vec<usize>, Vec<usize>) {
    let mut processing = Vec::new();
    let mut complete = Vec::new();
    for event in events {
        match event {
            StreamEvent::Processing { section_index, .. } => processing.push(*section_index),
            StreamEvent::SectionComplete { section_index, .. } => complete.push(*section_index),
            _ => {}
        }
    }
    (processing, complete)
}

#[tokio::test]
async fn test_article_stream_scenario() {
    let markup = "<h1>Intro</h1><p>One. Two.</p><h2>Body</h2><ul><li>a</li><li>b</li></ul>";
    let oracle = Arc::new(Identity::default());
    let events: Vec<_> = process_article(markup, None, oracle.clone(), &config(100), Cancellation::new())
        .collect()
        .await;

    let expected_result = Document::new(vec![section("Intro", "One. Two."), section("Body", "a b")]);
    assert_eq!(
        events,
        vec![
            StreamEvent::Start { total_sections: 2 },
            StreamEvent::Processing {
                section_index: 0,
                header: Some("Intro".into())
            },
            StreamEvent::SectionComplete {
                section_index: 0,
                section: section("Intro", "One. Two.")
            },
            StreamEvent::Processing {
                section_index: 1,
                header: Some("Body".into())
            },
            StreamEvent::SectionComplete {
                section_index: 1,
                section: section("Body", "a b")
            },
            StreamEvent::Complete {
                result: expected_result
            },
        ]
    );
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn test_title_becomes_metadata_event() {
    let events: Vec<_> = process_article(
        "<p>Body.</p>",
        Some("A title".into()),
        Arc::new(Identity::default()),
        &config(100),
        Cancellation::new(),
    )
    .collect()
    .await;
    assert_eq!(events[0], StreamEvent::Metadata { title: "A title".into() });
    assert_eq!(events[1], StreamEvent::Start { total_sections: 1 });
}

#[tokio::test]
async fn test_empty_section_skips_oracle() {
    let document = Document::new(vec![
        section("Text", "Some words."),
        Section {
            header: Some("Only a break".into()),
            content: vec![paragraph("  "), ContentBlock::Quote { parts: vec![] }],
        },
    ]);
    let oracle = Arc::new(Identity::default());
    let events: Vec<_> = Emitter::new(document, oracle.clone(), &config(100))
        .into_stream()
        .collect()
        .await;

    let (processing, complete) = indices(&events);
    assert_eq!(processing, vec![0]);
    assert_eq!(complete, vec![0, 1]);
    assert_eq!(
        events[3],
        StreamEvent::SectionComplete {
            section_index: 1,
            section: Section {
                header: Some("Only a break".into()),
                content: vec![]
            }
        }
    );
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_identity_oracle_never_converges() {
    let oracle = Identity::default();
    let text = (0..1000).map(|i| format!("w{}.", i)).collect::<Vec<_>>().join(" ");
    let params = ReduceParams {
        budget: 10,
        bounds: LengthBounds::new(2, 5),
        max_depth: 3,
    };

    let err = reduce(&text, &oracle, params).await.unwrap_err();
    match err {
        Error::ReductionNotConverging {
            attempts,
            tokens,
            budget,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(tokens, 1000);
            assert_eq!(budget, 10);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(oracle.calls(), 3);
}

#[tokio::test]
async fn test_short_input_reduces_with_one_call() {
    let oracle = Identity::default();
    let params = ReduceParams::from(&config(50));
    let out = reduce("Just a short paragraph.", &oracle, params).await.unwrap();
    assert_eq!(out, "Just a short paragraph.");
    assert_eq!(
        *oracle.batches.lock().unwrap(),
        vec![vec!["Just a short paragraph.".to_string()]]
    );
}

#[tokio::test]
async fn test_shrinking_oracle_converges_within_budget() {
    let oracle = Shrinking::default();
    let params = ReduceParams::from(&config(20));
    let out = reduce(&long_text(200), &oracle, params).await.unwrap();
    assert!(out.split_whitespace().count() <= 20);
    assert!(oracle.calls.load(Ordering::SeqCst) <= params.max_depth);
}

#[tokio::test]
async fn test_sections_stream_in_order() {
    let sections: Vec<_> = (0..7)
        .map(|i| section(&format!("S{}", i), &long_text(i * 10 + 1)))
        .collect();
    let events: Vec<_> = Emitter::new(Document::new(sections), Arc::new(Shrinking::default()), &config(20))
        .into_stream()
        .collect()
        .await;

    let (processing, complete) = indices(&events);
    assert_eq!(processing, (0..7).collect::<Vec<_>>());
    assert_eq!(complete, (0..7).collect::<Vec<_>>());
    assert!(matches!(events.last(), Some(StreamEvent::Complete { .. })));
}

#[tokio::test]
async fn test_complete_matches_replayed_updates() {
    let sections: Vec<_> = (0..3).map(|i| section(&format!("S{}", i), &long_text(30))).collect();
    let events: Vec<_> = Emitter::new(Document::new(sections), Arc::new(Shrinking::default()), &config(20))
        .into_stream()
        .collect()
        .await;

    let mut replayed = Vec::new();
    let mut result = None;
    for event in events {
        match event {
            StreamEvent::SectionComplete { section, .. } => replayed.push(section),
            StreamEvent::Complete { result: doc } => result = Some(doc),
            _ => {}
        }
    }
    assert_eq!(result, Some(Document::new(replayed)));
}

#[tokio::test]
async fn test_failure_ends_stream_with_single_error() {
    let document = Document::new(vec![
        section("A", "first."),
        section("B", "second."),
        section("C", "third."),
    ]);
    let oracle = Arc::new(FailsAfter::new(1));
    let events: Vec<_> = Emitter::new(document, oracle.clone(), &config(100))
        .into_stream()
        .collect()
        .await;

    let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(events.last(), Some(StreamEvent::Error { message }) if message.contains("unreachable")));

    let (processing, complete) = indices(&events);
    assert_eq!(processing, vec![0, 1]);
    assert_eq!(complete, vec![0]);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_disconnect_stops_oracle_calls() {
    let document = Document::new(vec![section("A", "one."), section("B", "two."), section("C", "three.")]);
    let oracle = Arc::new(Identity::default());
    let cancellation = Cancellation::new();
    let mut stream = Box::pin(
        Emitter::new(document, oracle.clone(), &config(100))
            .with_cancellation(cancellation.clone())
            .into_stream(),
    );

    while let Some(event) = stream.next().await {
        if matches!(event, StreamEvent::SectionComplete { section_index: 0, .. }) {
            cancellation.cancel();
        }
    }
    assert_eq!(oracle.calls(), 1);
}

#[tokio::test]
async fn test_disconnect_after_processing_skips_reduction() {
    let oracle = Arc::new(Identity::default());
    let cancellation = Cancellation::new();
    let mut stream = Box::pin(
        Emitter::new(Document::new(vec![section("A", "one.")]), oracle.clone(), &config(100))
            .with_cancellation(cancellation.clone())
            .into_stream(),
    );

    assert!(matches!(stream.next().await, Some(StreamEvent::Start { .. })));
    assert!(matches!(stream.next().await, Some(StreamEvent::Processing { .. })));
    cancellation.cancel();
    assert!(stream.next().await.is_none());
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_empty_document_completes_immediately() {
    let events: Vec<_> = process_article("   ", None, Arc::new(Identity::default()), &config(10), Cancellation::new())
        .collect()
        .await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Start { total_sections: 0 },
            StreamEvent::Complete {
                result: Document::default()
            }
        ]
    );
}
