use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit row written whenever a question's difficulty label changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyAdjustmentLog {
    pub id: Uuid,
    pub question_id: String,
    pub original_difficulty: Option<String>,
    pub new_difficulty: String,
    pub reason: String,
    pub adjusted_by: String,
    pub adjusted_at: DateTime<Utc>,
}
