//! Aggregates sentiment over an article's comments.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::ai::SentimentOracle;
use crate::Comment;

/// Characters of a comment sent to the classifier.
const CLASSIFY_CHARS: usize = 512;
/// Characters kept in an example before it is cut with an ellipsis.
const EXAMPLE_CHARS: usize = 150;
const EXAMPLES_PER_LABEL: usize = 3;
const UNKNOWN_AUTHOR: &str = "Unknown author";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Reads a classifier label; anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().trim_end_matches('.').to_lowercase();
        match label.as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentExample {
    pub author: String,
    pub text: String,
}

/// Result of [`aggregate`]. Unsuccessful reports carry the reason in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub total_comments: usize,
    pub sentiment_stats: BTreeMap<Sentiment, LabelStats>,
    pub examples: BTreeMap<Sentiment, Vec<CommentExample>>,
    pub success: bool,
    pub error: Option<String>,
}

impl SentimentReport {
    fn failed(reason: &str) -> Self {
        Self {
            total_comments: 0,
            sentiment_stats: BTreeMap::new(),
            examples: BTreeMap::new(),
            success: false,
            error: Some(reason.to_string()),
        }
    }

    /// Label with the most comments, ties broken by label order.
    pub fn dominant(&self) -> Option<(Sentiment, &LabelStats)> {
        self.sentiment_stats
            .iter()
            .max_by(|a, b| a.1.count.cmp(&b.1.count).then(b.0.cmp(a.0)))
            .map(|(label, stats)| (*label, stats))
    }
}

/// A comment that survived filtering.
struct ValidComment {
    author: String,
    text: String,
}

fn valid_comments(comments: &[Comment]) -> Vec<ValidComment> {
    comments
        .iter()
        .filter_map(|c| {
            let text = c.text.as_deref()?.trim();
            if text.is_empty() {
                return None;
            }
            Some(ValidComment {
                author: c
                    .author
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or(UNKNOWN_AUTHOR)
                    .to_string(),
                text: text.to_string(),
            })
        })
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Classifies every non-empty comment and summarizes the label distribution.
///
/// A comment whose classification fails counts as neutral.
pub async fn aggregate<O>(comments: &[Comment], oracle: &O) -> SentimentReport
where
    O: SentimentOracle + ?Sized,
{
    if comments.is_empty() {
        return SentimentReport::failed("no comments");
    }
    let valid = valid_comments(comments);
    if valid.is_empty() {
        return SentimentReport::failed("all comments are empty");
    }

    info!(comments = valid.len(), "analyzing comment sentiment");
    let inputs: Vec<String> = valid
        .iter()
        .map(|c| truncate_chars(&c.text, CLASSIFY_CHARS).to_string())
        .collect();
    let labels = oracle.classify_batch(&inputs).await;

    let mut groups: BTreeMap<Sentiment, Vec<&ValidComment>> = BTreeMap::new();
    for (comment, label) in valid.iter().zip(labels) {
        let label = label.unwrap_or_else(|e| {
            warn!("sentiment classification failed, counting as neutral: {}", e);
            Sentiment::Neutral
        });
        groups.entry(label).or_default().push(comment);
    }

    let total = valid.len();
    let sentiment_stats = groups
        .iter()
        .map(|(label, group)| {
            (
                *label,
                LabelStats {
                    count: group.len(),
                    percentage: percentage(group.len(), total),
                },
            )
        })
        .collect();

    let examples = groups
        .into_iter()
        .map(|(label, mut group)| {
            group.sort_by_key(|c| std::cmp::Reverse(c.text.chars().count()));
            let picked = group
                .into_iter()
                .take(EXAMPLES_PER_LABEL)
                .map(|c| {
                    let cut = truncate_chars(&c.text, EXAMPLE_CHARS);
                    let text = if cut.len() < c.text.len() {
                        format!("{}...", cut)
                    } else {
                        c.text.clone()
                    };
                    CommentExample {
                        author: c.author.clone(),
                        text,
                    }
                })
                .collect();
            (label, picked)
        })
        .collect();

    info!(comments = total, "comment analysis finished");
    SentimentReport {
        total_comments: total,
        sentiment_stats,
        examples,
        success: true,
        error: None,
    }
}

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "from", "have", "into", "just", "like", "more", "only",
    "that", "their", "them", "then", "there", "they", "this", "very", "what", "when", "which",
    "will", "with", "would", "your", "быть", "весь", "если", "когда", "который", "мочь", "один",
    "свой", "этот",
];

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Most frequent meaningful words across all comments, most frequent first.
///
/// Words are lowercased; only alphabetic words longer than three characters
/// that are not stop words count. Ties keep first-seen order.
pub fn top_words(comments: &[Comment], top_n: usize) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    let texts = comments.iter().filter_map(|c| c.text.as_deref());
    for text in texts {
        let stripped = markup_pattern().replace_all(text, " ");
        for word in stripped
            .split(|ch: char| !ch.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if word.chars().count() <= 3 || !word.chars().all(char::is_alphabetic) || stop.contains(word.as_str()) {
                continue;
            }
            let seen = counts.len();
            counts.entry(word).or_insert((0, seen)).0 += 1;
        }
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(top_n).map(|(word, _)| word).collect()
}

/// [`top_words`] over the comments the oracle labels as `label`.
///
/// A comment whose classification fails is left out.
pub async fn top_words_with_label<O>(comments: &[Comment], label: Sentiment, oracle: &O, top_n: usize) -> Vec<String>
where
    O: SentimentOracle + ?Sized,
{
    let candidates: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .collect();
    let inputs: Vec<String> = candidates
        .iter()
        .filter_map(|c| c.text.as_deref())
        .map(|t| truncate_chars(t.trim(), CLASSIFY_CHARS).to_string())
        .collect();
    let labels = oracle.classify_batch(&inputs).await;

    let matching: Vec<Comment> = candidates
        .into_iter()
        .zip(labels)
        .filter(|(_, result)| matches!(result, Ok(l) if *l == label))
        .map(|(comment, _)| comment.clone())
        .collect();
    top_words(&matching, top_n)
}

/// One-line description of the prevailing mood.
pub fn summary_line(report: &SentimentReport) -> String {
    let Some((label, stats)) = report.dominant().filter(|_| report.success) else {
        return "comment analysis unavailable".to_string();
    };
    let intensity = if stats.percentage > 60.0 {
        "mostly"
    } else if stats.percentage > 40.0 {
        "largely"
    } else {
        "partly"
    };
    format!(
        "Comments are {} {} ({}% of {})",
        intensity, label, stats.percentage, report.total_comments
    )
}
