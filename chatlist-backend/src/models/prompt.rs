use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prompt as submitted by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub tags: String,
}

/// A response the user chose to keep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub prompt_id: i64,
    pub model_id: i64,
    pub response_text: String,
    pub saved_at: DateTime<Utc>,
}

/// Saved response joined with the name of the model that produced it
#[derive(Debug, Clone, Serialize)]
pub struct SavedResult {
    pub model_name: String,
    pub response_text: String,
    pub saved_at: DateTime<Utc>,
}
