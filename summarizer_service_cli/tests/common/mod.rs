//! Scripted in-process oracles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use summarizer_service_cli::ai::{LengthBounds, SentimentOracle, SummarizationOracle};
use summarizer_service_cli::sentiment::Sentiment;
use summarizer_service_cli::{Error, Result};

/// Returns every input unchanged and records each batch.
#[derive(Default)]
pub struct Identity {
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl Identity {
    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl SummarizationOracle for Identity {
    async fn summarize_batch(&self, texts: &[String], _bounds: LengthBounds) -> Result<Vec<String>> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts.to_vec())
    }
}

/// Keeps the first `bounds.min_len` tokens of every input.
#[derive(Default)]
pub struct Shrinking {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SummarizationOracle for Shrinking {
    async fn summarize_batch(&self, texts: &[String], bounds: LengthBounds) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| t.split_whitespace().take(bounds.min_len).collect::<Vec<_>>().join(" "))
            .collect())
    }
}

/// Succeeds for the first `healthy_calls` calls, then reports the backend as down.
pub struct FailsAfter {
    pub healthy_calls: usize,
    pub calls: AtomicUsize,
}

impl FailsAfter {
    pub fn new(healthy_calls: usize) -> Self {
        Self {
            healthy_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SummarizationOracle for FailsAfter {
    async fn summarize_batch(&self, texts: &[String], _bounds: LengthBounds) -> Result<Vec<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.healthy_calls {
            return Err(Error::OracleUnavailable("backend unreachable".into()));
        }
        Ok(texts.iter().map(|_| "summary.".to_string()).collect())
    }
}

/// Looks each text up in a fixed table; unknown texts fail.
pub struct Scripted {
    pub labels: HashMap<String, Sentiment>,
}

#[async_trait]
impl SentimentOracle for Scripted {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        self.labels
            .get(text)
            .copied()
            .ok_or_else(|| Error::OracleUnavailable(format!("no label for {:?}", text)))
    }
}
