use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub article_url: String,
    pub summarized_text: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
}
