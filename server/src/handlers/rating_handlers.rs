use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::rating::Rating;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RatePayload {
    pub article_url: String,
    pub summarized_text: String,
    pub rating: i64,
}

pub async fn rate_article(
    State(state): State<AppState>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !(1..=5).contains(&payload.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Rating must be between 1 and 5" })),
        ));
    }
    if payload.article_url.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "article_url is required" })),
        ));
    }

    let id = Uuid::new_v4();
    state.ratings.insert(
        id,
        Rating {
            id,
            article_url: payload.article_url,
            summarized_text: payload.summarized_text,
            rating: payload.rating as u8,
            created_at: Utc::now(),
        },
    );
    info!(%id, rating = payload.rating, "rating stored");

    Ok((StatusCode::OK, Json(json!({ "success": true, "id": id }))))
}

pub async fn list_ratings(State(state): State<AppState>) -> impl IntoResponse {
    let mut ratings: Vec<Rating> = state.ratings.iter().map(|entry| entry.value().clone()).collect();
    ratings.sort_by_key(|r| r.created_at);

    (StatusCode::OK, Json(json!({ "ratings": ratings })))
}
