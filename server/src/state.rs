// server/src/state.rs
use dashmap::DashMap;
use std::sync::Arc;
use summarizer_service_cli::ai::{SentimentOracle, SummarizationOracle};
use summarizer_service_cli::config::SummarizerConfig;
use summarizer_service_cli::scraper::ArticleSource;
use uuid::Uuid;

use crate::models::rating::Rating;

// Shared application state: collaborators are built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<dyn ArticleSource>,
    pub summarizer: Arc<dyn SummarizationOracle>,
    pub classifier: Arc<dyn SentimentOracle>,
    pub config: SummarizerConfig,
    pub ratings: Arc<DashMap<Uuid, Rating>>,
}

impl AppState {
    pub fn new(
        articles: Arc<dyn ArticleSource>,
        summarizer: Arc<dyn SummarizationOracle>,
        classifier: Arc<dyn SentimentOracle>,
        config: SummarizerConfig,
    ) -> Self {
        AppState {
            articles,
            summarizer,
            classifier,
            config,
            ratings: Arc::new(DashMap::new()),
        }
    }
}
