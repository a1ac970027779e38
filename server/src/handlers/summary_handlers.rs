// server/src/handlers/summary_handlers.rs
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use summarizer_service_cli::{
    emitter::{Cancellation, StreamEvent},
    pipeline::process_article,
    sentiment::{aggregate, SentimentReport},
    Comment,
};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct SummarizePayload {
    pub link: String,
}

#[derive(Deserialize)]
pub struct AnalyzeCommentsPayload {
    pub comments: Vec<Comment>,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Article summarizer is running" }))
}

/// POST /summarize
///
/// Answers with a server-sent event stream; each frame is one JSON-encoded
/// `StreamEvent`. When the client goes away the body stream is dropped,
/// which stops further oracle calls.
pub async fn summarize(
    State(state): State<AppState>,
    Json(payload): Json<SummarizePayload>,
) -> impl IntoResponse {
    info!(link = %payload.link, "summarize requested");

    let events: BoxStream<'static, StreamEvent> = match state.articles.fetch_article(&payload.link).await {
        Ok(article) => process_article(
            &article.body_markup,
            Some(article.title),
            state.summarizer.clone(),
            &state.config,
            Cancellation::new(),
        )
        .boxed(),
        Err(e) => {
            warn!(link = %payload.link, "article unavailable: {}", e);
            stream::once(async move {
                StreamEvent::Error {
                    message: e.to_string(),
                }
            })
            .boxed()
        }
    };

    let frames = events.map(|event| Event::default().json_data(&event));
    Sse::new(frames).keep_alive(KeepAlive::default())
}

/// POST /analyze-comments
pub async fn analyze_comments(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeCommentsPayload>,
) -> Json<SentimentReport> {
    let report = aggregate(&payload.comments, state.classifier.as_ref()).await;
    Json(report)
}
