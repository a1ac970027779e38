use axum::{routing::{get, post}, Router};
use crate::handlers::rating_handlers::{list_ratings, rate_article};
use crate::state::AppState;

pub fn rating_routes(state: AppState) -> Router {
    Router::new()
        .route("/rate", post(rate_article))
        .route("/ratings", get(list_ratings))
        .with_state(state)
}
