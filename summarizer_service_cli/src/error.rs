//! Error types for the summarization pipeline.

use std::io;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching, structuring or summarizing an article.
///
/// A consumer disconnecting is not an error: the event stream just ends.
#[derive(Error, Debug)]
pub enum Error {
    /// The markup could not be turned into a document.
    #[error("Structure parse failure: {0}")]
    StructureParseFailure(String),

    /// The model or classification backend could not be reached.
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The backend answered, but not with what the oracle contract promises.
    #[error("Invalid oracle response: {0}")]
    OracleResponse(String),

    /// Repeated reduction passes did not bring the text under the budget.
    #[error("Reduction did not converge after {attempts} attempts ({tokens} tokens left, budget {budget})")]
    ReductionNotConverging {
        attempts: usize,
        tokens: usize,
        budget: usize,
    },

    /// Retrieving the article page failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A configuration value is missing, unparsable or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::OracleResponse(err.to_string())
        } else {
            Error::Fetch(err.to_string())
        }
    }
}
