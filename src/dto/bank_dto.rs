use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::feedback::Feedback;
use crate::models::question::{QuestionRecord, QuestionType};
use crate::services::extraction_service::ExtractionStrategy;
use crate::utils::text::{extract_answer, sanitize_content, sanitize_title};
use crate::utils::time::now;
use crate::utils::validation::{validate_area, validate_difficulty};

#[derive(Debug, Deserialize, Validate)]
pub struct ExtractPayload {
    #[validate(length(max = 1_000_000))]
    pub raw_text: String,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub required_fields: Option<Vec<String>>,
}

impl ExtractPayload {
    /// Explicit field list wins over the one implied by the question type.
    pub fn required_fields(&self) -> Vec<String> {
        match (&self.required_fields, self.question_type) {
            (Some(fields), _) => fields.clone(),
            (None, Some(t)) => t.required_fields().iter().map(|f| f.to_string()).collect(),
            (None, None) => vec![],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub record: JsonValue,
    pub strategy: ExtractionStrategy,
    pub is_stub: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuestionPayload {
    #[validate(custom(function = "validate_area"))]
    pub area: String,
    #[validate(custom(function = "validate_difficulty"))]
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(max = 2000))]
    pub context: Option<String>,
    /// Store the generated question right away.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveQuestionPayload {
    #[validate(length(min = 1, max = 128))]
    pub id: String,
    #[validate(custom(function = "validate_area"))]
    pub area: String,
    #[validate(length(min = 1))]
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(min = 1))]
    pub question: String,
    #[serde(default)]
    pub ai_generated: bool,
    pub metadata: Option<JsonValue>,
}

impl From<SaveQuestionPayload> for QuestionRecord {
    fn from(p: SaveQuestionPayload) -> Self {
        QuestionRecord {
            id: p.id,
            area: p.area,
            difficulty: p.difficulty,
            question_type: p.question_type,
            question: p.question,
            ai_generated: p.ai_generated,
            metadata: p
                .metadata
                .unwrap_or_else(|| JsonValue::Object(Default::default())),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TranslateBatchPayload {
    #[validate(length(min = 1, max = 50))]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackPayload {
    #[validate(length(min = 1))]
    pub question_id: String,
    pub user_id: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub difficulty_rating: u8,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub relevance_rating: u8,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub clarity_rating: u8,
    #[serde(default)]
    pub comments: String,
    pub actual_difficulty: Option<String>,
}

impl From<FeedbackPayload> for Feedback {
    fn from(p: FeedbackPayload) -> Self {
        Feedback {
            question_id: p.question_id,
            user_id: p.user_id.unwrap_or_else(|| "anonymous".to_string()),
            difficulty_rating: p.difficulty_rating,
            relevance_rating: p.relevance_rating,
            clarity_rating: p.clarity_rating,
            comments: p.comments,
            actual_difficulty: p.actual_difficulty,
            created_at: now(),
        }
    }
}

/// Reviewer-facing row for question lists.
#[derive(Debug, Serialize)]
pub struct QuestionSummary {
    pub id: String,
    pub area: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    /// Cleaned scenario, or the task when there is no scenario.
    pub preview: String,
    pub answer: String,
    pub ai_generated: bool,
}

const PREVIEW_KEYS: [&str; 2] = ["scenario", "task"];

impl From<&QuestionRecord> for QuestionSummary {
    fn from(q: &QuestionRecord) -> Self {
        QuestionSummary {
            id: q.id.clone(),
            area: q.area.clone(),
            difficulty: q.difficulty.clone(),
            question_type: q.question_type,
            title: sanitize_title(&q.question),
            preview: PREVIEW_KEYS
                .iter()
                .filter_map(|k| q.metadata.get(*k).and_then(JsonValue::as_str))
                .map(sanitize_content)
                .find(|text| !text.is_empty())
                .unwrap_or_default(),
            answer: extract_answer(q),
            ai_generated: q.ai_generated,
        }
    }
}
