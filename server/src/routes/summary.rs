use axum::{routing::{get, post}, Router};
use crate::handlers::summary_handlers::{analyze_comments, root, summarize};
use crate::state::AppState;

pub fn summary_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/summarize", post(summarize))
        .route("/analyze-comments", post(analyze_comments))
        .with_state(state)
}
