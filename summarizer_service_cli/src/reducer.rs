//! Recursive chunk → summarize → join reduction of long text.

use tracing::{debug, info};

use crate::ai::{LengthBounds, SummarizationOracle};
use crate::chunker::{self, token_count, Chunk};
use crate::config::SummarizerConfig;
use crate::{Error, Result};

/// Parameters of one reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceParams {
    pub budget: usize,
    pub bounds: LengthBounds,
    pub max_depth: usize,
}

impl From<&SummarizerConfig> for ReduceParams {
    fn from(config: &SummarizerConfig) -> Self {
        Self {
            budget: config.chunk_budget,
            bounds: LengthBounds::new(config.min_output_len, config.max_output_len),
            max_depth: config.max_reduction_depth,
        }
    }
}

async fn call_oracle<O>(oracle: &O, texts: Vec<String>, bounds: LengthBounds) -> Result<Vec<String>>
where
    O: SummarizationOracle + ?Sized,
{
    let expected = texts.len();
    let summaries = oracle.summarize_batch(&texts, bounds).await?;
    if summaries.len() != expected {
        return Err(Error::OracleResponse(format!(
            "expected {} summaries, got {}",
            expected,
            summaries.len()
        )));
    }
    Ok(summaries)
}

/// Shrinks `text` until it fits `params.budget` tokens.
///
/// Text already within the budget goes to the oracle once, as a batch of one.
/// Longer text is chunked, all chunks are summarized in a single oracle call,
/// and the summaries are joined with spaces; the join is reduced again while
/// it stays over budget. Each oracle call counts as one attempt, and more
/// than `params.max_depth` attempts fail with
/// [`Error::ReductionNotConverging`].
pub async fn reduce<O>(text: &str, oracle: &O, params: ReduceParams) -> Result<String>
where
    O: SummarizationOracle + ?Sized,
{
    let budget = params.budget.max(1);
    let mut current = text.split_whitespace().collect::<Vec<_>>().join(" ");

    for depth in 1..=params.max_depth {
        let tokens = token_count(&current);
        if tokens <= budget {
            debug!(depth, tokens, "reducing single text");
            let mut summaries = call_oracle(oracle, vec![current], params.bounds).await?;
            return summaries
                .pop()
                .ok_or_else(|| Error::OracleResponse("empty summary batch".into()));
        }

        let chunks: Vec<String> = chunker::split(&current, budget)
            .into_iter()
            .map(Chunk::into_text)
            .collect();
        info!(depth, tokens, chunks = chunks.len(), "reduction pass");

        let combined = call_oracle(oracle, chunks, params.bounds).await?.join(" ");
        let combined_tokens = token_count(&combined);
        if combined_tokens <= budget {
            return Ok(combined);
        }
        current = combined;
    }

    Err(Error::ReductionNotConverging {
        attempts: params.max_depth,
        tokens: token_count(&current),
        budget,
    })
}
