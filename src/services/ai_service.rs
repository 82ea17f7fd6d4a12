use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::models::question::{time_limit_for, QuestionRecord, QuestionType};
use crate::services::chat_client::ChatModel;
use crate::services::extraction_service::{
    Extraction, ExtractionService, ExtractionStrategy, JsonMap,
};
use crate::utils::time::{id_stamp, now};

const DEFAULT_SYSTEM_PROMPT: &str = "You write assessment questions that measure how well \
people use AI tools at work. Questions must need human judgement, not just a model's answer. \
Reply with a single JSON object and nothing else.";

/// Language tag assumed when the model omits `lang`.
pub const DEFAULT_LANG: &str = "kr";

const MULTIPLE_CHOICE_METADATA: [(&str, MetaDefault); 7] = [
    ("lang", MetaDefault::Lang),
    ("category", MetaDefault::Area),
    ("topic", MetaDefault::Text),
    ("estimatedTime", MetaDefault::Text),
    ("scenario", MetaDefault::Text),
    ("reference", MetaDefault::Object),
    ("steps", MetaDefault::List),
];

const SUBJECTIVE_METADATA: [(&str, MetaDefault); 14] = [
    ("lang", MetaDefault::Lang),
    ("category", MetaDefault::Area),
    ("topic", MetaDefault::Text),
    ("time_limit", MetaDefault::Text),
    ("topic_summary", MetaDefault::Text),
    ("scenario", MetaDefault::Text),
    ("goal", MetaDefault::List),
    ("task", MetaDefault::Text),
    ("reference", MetaDefault::Object),
    ("first_question", MetaDefault::List),
    ("requirements", MetaDefault::List),
    ("constraints", MetaDefault::List),
    ("guide", MetaDefault::Object),
    ("evaluation", MetaDefault::List),
];

#[derive(Clone, Copy)]
enum MetaDefault {
    Lang,
    Area,
    Text,
    Object,
    List,
}

#[derive(Clone, Debug, Serialize)]
pub struct GenerationOutput {
    pub question: QuestionRecord,
    pub raw_content: String,
    pub strategy: ExtractionStrategy,
    pub is_stub: bool,
    pub logs: Vec<String>,
}

#[derive(Clone)]
pub struct AIService {
    chat: Arc<dyn ChatModel>,
    system_prompt: String,
    extractor: ExtractionService,
}

impl AIService {
    pub fn new(chat: Arc<dyn ChatModel>, extractor: ExtractionService) -> Self {
        Self {
            chat,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            extractor,
        }
    }

    pub fn from_config(
        chat: Arc<dyn ChatModel>,
        config: &Config,
        extractor: ExtractionService,
    ) -> Self {
        let mut service = Self::new(chat, extractor);
        if let Some(prompt) = &config.generation_system_prompt {
            service.system_prompt = prompt.clone();
        }
        service
    }

    pub async fn generate_question(
        &self,
        area: &str,
        difficulty: &str,
        question_type: QuestionType,
        context: Option<&str>,
    ) -> Result<GenerationOutput> {
        let model = self.chat.model_name();
        let mut logs: Vec<String> = vec![];
        logs.push(format!(
            "Generating {} question for area '{}' at '{}'.",
            question_type.as_str(),
            area,
            difficulty
        ));

        logs.push(format!("Sending request to {}...", model));
        let raw_content = self
            .chat
            .complete(
                &self.system_prompt,
                &user_prompt(area, difficulty, question_type, context),
            )
            .await?;
        logs.push(format!("Response received ({} chars). Extracting...", raw_content.len()));

        let extraction = self.extractor.extract(&raw_content, question_type.required_fields());
        let strategy = extraction.strategy;
        let is_stub = extraction.is_stub();
        if is_stub {
            tracing::warn!(area, difficulty, "Model reply had no usable record");
            logs.push("No structured record found; stored raw text as title.".to_string());
        } else {
            logs.push(format!("Extracted with {:?}.", strategy));
        }

        let suffix = rand::thread_rng().gen_range(1000..=9999);
        let question = build_question_record(
            extraction,
            area,
            difficulty,
            question_type,
            &model,
            now(),
            suffix,
        );
        tracing::info!(id = %question.id, ?strategy, "Question generated");
        logs.push(format!("Built question {}.", question.id));

        Ok(GenerationOutput {
            question,
            raw_content,
            strategy,
            is_stub,
            logs,
        })
    }
}

fn user_prompt(
    area: &str,
    difficulty: &str,
    question_type: QuestionType,
    context: Option<&str>,
) -> String {
    let keys = match question_type {
        QuestionType::MultipleChoice => MULTIPLE_CHOICE_METADATA
            .iter()
            .map(|(k, _)| *k)
            .chain(["problemTitle", "difficulty"])
            .collect::<Vec<_>>(),
        QuestionType::Subjective => SUBJECTIVE_METADATA
            .iter()
            .map(|(k, _)| *k)
            .chain(["title", "difficulty"])
            .collect::<Vec<_>>(),
    };
    format!(
        "Create one {} question.\nArea: {}\nDifficulty: {}\n{}: {}\nExtra requirements: {}\nJSON keys: {}",
        question_type.as_str().replace('_', " "),
        area,
        difficulty,
        question_type.time_field(),
        time_limit_for(difficulty),
        context.filter(|c| !c.trim().is_empty()).unwrap_or("none"),
        keys.join(", ")
    )
}

/// Shapes an extracted model reply into a storable question. `suffix` is the
/// random `1000..=9999` tail of the id.
pub fn build_question_record(
    extraction: Extraction,
    area: &str,
    difficulty: &str,
    question_type: QuestionType,
    model: &str,
    generated_at: DateTime<Utc>,
    suffix: u16,
) -> QuestionRecord {
    let stamp = id_stamp(generated_at);
    let mut record = extraction.record;

    let question = match record.get(question_type.title_field()) {
        Some(JsonValue::String(s)) => s.clone(),
        _ => String::new(),
    };

    let fields: &[(&str, MetaDefault)] = match question_type {
        QuestionType::MultipleChoice => &MULTIPLE_CHOICE_METADATA,
        QuestionType::Subjective => &SUBJECTIVE_METADATA,
    };

    let mut metadata = JsonMap::new();
    metadata.insert("generated_at".to_string(), JsonValue::String(stamp.clone()));
    metadata.insert("model".to_string(), JsonValue::String(model.to_string()));
    for (key, default) in fields {
        let value = match default {
            // Category always mirrors the requested area.
            MetaDefault::Area => JsonValue::String(area.to_string()),
            _ => record.remove(*key).unwrap_or_else(|| match default {
                MetaDefault::Lang => JsonValue::String(DEFAULT_LANG.to_string()),
                MetaDefault::Object => JsonValue::Object(JsonMap::new()),
                MetaDefault::List => JsonValue::Array(vec![]),
                _ => JsonValue::String(String::new()),
            }),
        };
        metadata.insert(key.to_string(), value);
    }

    QuestionRecord {
        id: format!("Q_AI_{}_{}", stamp, suffix),
        area: area.to_string(),
        difficulty: difficulty.to_string(),
        question_type,
        question,
        ai_generated: true,
        metadata: JsonValue::Object(metadata),
    }
}
