use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::OracleConfig;
use crate::sentiment::Sentiment;
use crate::{Error, Result};

/// Length window, in tokens, that every summary should fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min_len: usize,
    pub max_len: usize,
}

impl LengthBounds {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }
}

/// Maps a batch of bounded texts to shorter texts.
///
/// `result[i]` must be the summary of `texts[i]` and the output must have
/// exactly as many elements as the input.
#[async_trait]
pub trait SummarizationOracle: Send + Sync {
    async fn summarize_batch(&self, texts: &[String], bounds: LengthBounds) -> Result<Vec<String>>;
}

/// Labels a short text as positive, negative or neutral.
#[async_trait]
pub trait SentimentOracle: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Sentiment>;

    /// Classifies each text in order; one failure does not stop the rest.
    async fn classify_batch(&self, texts: &[String]) -> Vec<Result<Sentiment>> {
        let mut labels = Vec::with_capacity(texts.len());
        for text in texts {
            labels.push(self.classify(text).await);
        }
        labels
    }
}

/// Both oracles backed by an OpenAI-compatible chat-completions endpoint.
pub struct AIAnalyzer {
    client: reqwest::Client,
    config: OracleConfig,
}

impl AIAnalyzer {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::OracleUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                .map_err(|e| Error::InvalidConfig(format!("API key is not a valid header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn complete(&self, system: &str, user: &str, max_tokens: usize, temperature: f32) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": temperature,
            "max_tokens": max_tokens
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::OracleUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::OracleUnavailable(format!(
                "{} answered HTTP {}",
                self.config.endpoint,
                response.status()
            )));
        }

        let result = response
            .json::<Value>()
            .await
            .map_err(|e| Error::OracleResponse(e.to_string()))?;
        message_content(&result)
    }

    async fn summarize_one(&self, text: &str, bounds: LengthBounds) -> Result<String> {
        let system = format!(
            "You shorten article sections. Reply with the summary only, between {} and {} words, \
             in the language of the input.",
            bounds.min_len, bounds.max_len
        );
        // Model tokens run longer than words; leave headroom for the upper bound.
        let summary = self.complete(&system, text, bounds.max_len * 2, 0.3).await?;
        Ok(summary.trim().to_string())
    }
}

fn message_content(result: &Value) -> Result<String> {
    result["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::OracleResponse("response has no choices[0].message.content".into()))
}

#[async_trait]
impl SummarizationOracle for AIAnalyzer {
    /// Runs at most `batch_size` requests at a time; output keeps input order.
    async fn summarize_batch(&self, texts: &[String], bounds: LengthBounds) -> Result<Vec<String>> {
        debug!(texts = texts.len(), batch_size = self.config.batch_size, "summarizing batch");
        stream::iter(texts.iter().cloned())
            .map(|text| async move { self.summarize_one(&text, bounds).await })
            .buffered(self.config.batch_size)
            .try_collect()
            .await
    }
}

#[async_trait]
impl SentimentOracle for AIAnalyzer {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let reply = self
            .complete(
                "Classify the sentiment of the user's comment. Answer with exactly one word: \
                 positive, negative or neutral.",
                text,
                4,
                0.0,
            )
            .await?;
        Ok(Sentiment::from_label(&reply))
    }

    async fn classify_batch(&self, texts: &[String]) -> Vec<Result<Sentiment>> {
        stream::iter(texts.iter().cloned())
            .map(|text| async move { self.classify(&text).await })
            .buffered(self.config.batch_size)
            .collect()
            .await
    }
}
