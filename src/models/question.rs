use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const VALID_AREAS: [&str; 5] = [
    "life",
    "news",
    "interview",
    "learning_concept",
    "pharma_distribution",
];

pub const VALID_DIFFICULTIES: [&str; 5] = ["very easy", "easy", "normal", "hard", "very hard"];

pub const DEFAULT_DIFFICULTY: &str = "normal";
pub const DEFAULT_AREA: &str = "life";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Subjective,
}

impl QuestionType {
    /// Keys a model response must carry to count as a real question of this type.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            QuestionType::MultipleChoice => &["problemTitle", "steps"],
            QuestionType::Subjective => &["title", "task"],
        }
    }

    /// Key holding the question's headline in a model response.
    pub fn title_field(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "problemTitle",
            QuestionType::Subjective => "title",
        }
    }

    /// Key holding the time limit in a model response.
    pub fn time_field(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "estimatedTime",
            QuestionType::Subjective => "time_limit",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Subjective => "subjective",
        }
    }
}

/// Time limit suggested to the model for each difficulty label.
pub fn time_limit_for(difficulty: &str) -> &'static str {
    match difficulty {
        "very easy" => "3 minutes",
        "easy" => "4 minutes",
        "hard" => "7 minutes",
        "very hard" => "10 minutes",
        _ => "5 minutes",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub area: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default = "empty_metadata")]
    pub metadata: JsonValue,
}

fn empty_metadata() -> JsonValue {
    JsonValue::Object(Default::default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionFilter {
    pub id: Option<String>,
    pub area: Option<String>,
    pub difficulty: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
}

impl QuestionFilter {
    pub fn matches(&self, q: &QuestionRecord) -> bool {
        self.id.as_deref().map_or(true, |id| q.id == id)
            && self.area.as_deref().map_or(true, |a| q.area == a)
            && self.difficulty.as_deref().map_or(true, |d| q.difficulty == d)
            && self.question_type.map_or(true, |t| q.question_type == t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(area: &str, difficulty: &str, question_type: QuestionType) -> QuestionRecord {
        QuestionRecord {
            id: "Q1".into(),
            area: area.into(),
            difficulty: difficulty.into(),
            question_type,
            question: "q".into(),
            ai_generated: false,
            metadata: empty_metadata(),
        }
    }

    #[test]
    fn filter_combines_all_present_fields() {
        let q = record("news", "hard", QuestionType::Subjective);
        assert!(QuestionFilter::default().matches(&q));

        let filter = QuestionFilter {
            area: Some("news".into()),
            question_type: Some(QuestionType::Subjective),
            ..Default::default()
        };
        assert!(filter.matches(&q));

        let filter = QuestionFilter {
            area: Some("news".into()),
            difficulty: Some("easy".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&q));
    }

    #[test]
    fn record_uses_type_key_on_the_wire() {
        let q = record("life", "normal", QuestionType::MultipleChoice);
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "multiple_choice");

        let back: QuestionRecord = serde_json::from_value(serde_json::json!({
            "id": "Q2",
            "area": "life",
            "difficulty": "easy",
            "type": "subjective",
            "question": "Plan a trip"
        }))
        .unwrap();
        assert_eq!(back.question_type, QuestionType::Subjective);
        assert!(back.metadata.is_object());
    }
}
