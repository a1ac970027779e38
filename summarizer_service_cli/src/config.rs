//! Runtime configuration for the summarization pipeline and its oracle.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::{Error, Result};

/// Knobs of the chunk/reduce/emit pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Token budget for one oracle input.
    pub chunk_budget: usize,
    /// Lower bound on summary length, in tokens.
    pub min_output_len: usize,
    /// Upper bound on summary length, in tokens.
    pub max_output_len: usize,
    /// Oracle requests kept in flight at once.
    pub batch_size: usize,
    /// Reduction passes allowed before giving up.
    pub max_reduction_depth: usize,
    /// Strip URLs, e-mails and markup from section text before reducing.
    pub advanced_cleanup: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_budget: 450,
            min_output_len: 150,
            max_output_len: 350,
            batch_size: 8,
            max_reduction_depth: 8,
            advanced_cleanup: false,
        }
    }
}

impl SummarizerConfig {
    /// Defaults overridden by environment variables (after loading `.env`).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();
        let config = Self {
            chunk_budget: env_or("CHUNK_BUDGET", defaults.chunk_budget)?,
            min_output_len: env_or("MIN_OUTPUT_LEN", defaults.min_output_len)?,
            max_output_len: env_or("MAX_OUTPUT_LEN", defaults.max_output_len)?,
            batch_size: env_or("BATCH_SIZE", defaults.batch_size)?,
            max_reduction_depth: env_or("MAX_REDUCTION_DEPTH", defaults.max_reduction_depth)?,
            advanced_cleanup: env_or("ADVANCED_CLEANUP", defaults.advanced_cleanup)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_budget == 0 {
            return Err(Error::InvalidConfig("chunk_budget must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        if self.max_reduction_depth == 0 {
            return Err(Error::InvalidConfig("max_reduction_depth must be positive".into()));
        }
        if self.min_output_len > self.max_output_len {
            return Err(Error::InvalidConfig(format!(
                "min_output_len ({}) exceeds max_output_len ({})",
                self.min_output_len, self.max_output_len
            )));
        }
        Ok(())
    }
}

/// Where the HTTP oracle sends its requests.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub batch_size: usize,
}

impl OracleConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Reads `ORACLE_URL`, `ORACLE_MODEL` and `ORACLE_API_KEY`
    /// (falling back to `OPENAI_API_KEY`).
    pub fn from_env(batch_size: usize) -> Result<Self> {
        dotenv::dotenv().ok();
        let api_key = env::var("ORACLE_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| Error::InvalidConfig("ORACLE_API_KEY or OPENAI_API_KEY must be set".into()))?;
        Ok(Self {
            endpoint: env::var("ORACLE_URL").unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: env::var("ORACLE_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
            batch_size: batch_size.max(1),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
