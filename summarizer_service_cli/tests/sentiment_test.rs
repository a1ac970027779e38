//! Integration tests for comment sentiment aggregation.

mod common;

use common::Scripted;
use std::collections::HashMap;
use summarizer_service_cli::sentiment::{aggregate, summary_line, Sentiment};
use summarizer_service_cli::Comment;

fn scripted(comments: &[Comment], label_of: impl Fn(usize) -> Sentiment) -> Scripted {
    let labels: HashMap<String, Sentiment> = comments
        .iter()
        .enumerate()
        .filter_map(|(i, c)| Some((c.text.clone()?.trim().chars().take(512).collect(), label_of(i))))
        .collect();
    Scripted { labels }
}

#[tokio::test]
async fn test_six_positive_four_negative() {
    let comments: Vec<Comment> = (0..10)
        .map(|i| Comment::new(format!("user{}", i), format!("comment {} {}", i, "x".repeat(i * 40))))
        .collect();
    let oracle = scripted(&comments, |i| if i < 6 { Sentiment::Positive } else { Sentiment::Negative });

    let report = aggregate(&comments, &oracle).await;
    assert!(report.success);
    assert_eq!(report.total_comments, 10);
    assert_eq!(report.sentiment_stats[&Sentiment::Positive].count, 6);
    assert_eq!(report.sentiment_stats[&Sentiment::Positive].percentage, 60.0);
    assert_eq!(report.sentiment_stats[&Sentiment::Negative].percentage, 40.0);
    assert!(!report.sentiment_stats.contains_key(&Sentiment::Neutral));

    for examples in report.examples.values() {
        assert!(examples.len() <= 3);
        for example in examples {
            let chars = example.text.chars().count();
            assert!(chars <= 150 || (chars == 153 && example.text.ends_with("...")));
        }
    }

    // Longest first: user5 is the longest positive comment.
    let positive = &report.examples[&Sentiment::Positive];
    assert_eq!(positive.len(), 3);
    assert_eq!(positive[0].author, "user5");
    assert_eq!(positive[1].author, "user4");
    assert!(positive[0].text.ends_with("..."));

    assert_eq!(summary_line(&report), "Comments are largely positive (60% of 10)");
}

#[tokio::test]
async fn test_invalid_comments_are_filtered() {
    let comments = vec![
        Comment::new("a", "good"),
        Comment { author: Some("b".into()), text: Some("   ".into()) },
        Comment { author: None, text: None },
    ];
    let oracle = scripted(&comments, |_| Sentiment::Positive);
    let report = aggregate(&comments, &oracle).await;
    assert_eq!(report.total_comments, 1);
    assert_eq!(report.sentiment_stats[&Sentiment::Positive].percentage, 100.0);
}

#[tokio::test]
async fn test_classification_failure_counts_as_neutral() {
    let comments = vec![Comment::new("a", "known"), Comment::new("b", "unknown")];
    let oracle = Scripted {
        labels: HashMap::from([("known".to_string(), Sentiment::Negative)]),
    };
    let report = aggregate(&comments, &oracle).await;
    assert!(report.success);
    assert_eq!(report.sentiment_stats[&Sentiment::Negative].count, 1);
    assert_eq!(report.sentiment_stats[&Sentiment::Neutral].count, 1);
    assert_eq!(report.sentiment_stats[&Sentiment::Neutral].percentage, 50.0);
}

#[tokio::test]
async fn test_empty_input_is_reported_not_raised() {
    let oracle = Scripted { labels: HashMap::new() };

    let report = aggregate(&[], &oracle).await;
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("no comments"));

    let blank = vec![Comment::new("a", " ")];
    let report = aggregate(&blank, &oracle).await;
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("all comments are empty"));
    assert_eq!(report.total_comments, 0);
}

#[tokio::test]
async fn test_report_json_shape() {
    let comments = vec![Comment::new("a", "fine")];
    let oracle = scripted(&comments, |_| Sentiment::Neutral);
    let report = aggregate(&comments, &oracle).await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["sentiment_stats"]["neutral"]["count"], 1);
    assert_eq!(json["examples"]["neutral"][0]["author"], "a");
    assert_eq!(json["success"], true);
}
