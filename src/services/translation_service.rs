//! English translation of stored questions through a chat model.

use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::{Arc, OnceLock};

use crate::models::question::QuestionRecord;
use crate::services::chat_client::ChatModel;
use crate::services::extraction_service::{ExtractionService, ExtractionStrategy};

pub const TARGET_LANG: &str = "en";

const DEFAULT_TRANSLATION_PROMPT: &str = "You are a professional translator of educational \
content. Translate the user's text into English. Keep technical accuracy, a professional tone \
and the original formatting. Return only the translated text.";

/// Metadata keys whose values are identifiers or labels, never prose.
const UNTRANSLATED_KEYS: [&str; 10] = [
    "lang",
    "model",
    "generated_at",
    "category",
    "topic",
    "difficulty",
    "id",
    "answer",
    "ref_paths",
    "step",
];

const TIME_KEYS: [&str; 2] = ["time_limit", "estimatedTime"];

/// Keys a model may wrap its translation in when it answers with JSON.
const WRAPPER_KEYS: [&str; 3] = ["translation", "title", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    Text,
    TimeLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslatedQuestion {
    pub source_question_id: String,
    pub lang: String,
    pub question: QuestionRecord,
    pub translated_fields: usize,
    /// Leaves kept in the source language because the model call failed.
    pub failed_fields: usize,
}

#[derive(Clone)]
pub struct TranslationService {
    chat: Arc<dyn ChatModel>,
    system_prompt: String,
}

impl TranslationService {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            system_prompt: DEFAULT_TRANSLATION_PROMPT.to_string(),
        }
    }

    /// Translates the question text and every prose leaf of its metadata.
    /// A leaf whose model call fails keeps its original text.
    pub async fn translate_question(&self, source: &QuestionRecord) -> TranslatedQuestion {
        let mut question = source.clone();
        let mut translated_fields = 0;
        let mut failed_fields = 0;

        {
            let mut leaves: Vec<(&mut String, LeafKind)> = vec![(&mut question.question, LeafKind::Text)];
            collect_leaves(&mut question.metadata, None, &mut leaves);

            for (leaf, kind) in leaves {
                if leaf.trim().is_empty() {
                    continue;
                }
                let outcome = match kind {
                    LeafKind::TimeLimit => match translate_time_limit(leaf) {
                        Some(fixed) => Some(fixed),
                        None => self.translate_text(leaf).await,
                    },
                    LeafKind::Text => self.translate_text(leaf).await,
                };
                match outcome {
                    Some(text) => {
                        *leaf = text;
                        translated_fields += 1;
                    }
                    None => failed_fields += 1,
                }
            }
        }

        if let JsonValue::Object(map) = &mut question.metadata {
            map.insert("lang".to_string(), JsonValue::String(TARGET_LANG.to_string()));
        }

        tracing::info!(
            question_id = %source.id,
            translated_fields,
            failed_fields,
            "Question translated"
        );
        TranslatedQuestion {
            source_question_id: source.id.clone(),
            lang: TARGET_LANG.to_string(),
            question,
            translated_fields,
            failed_fields,
        }
    }

    pub async fn translate_batch(&self, questions: &[QuestionRecord]) -> Vec<TranslatedQuestion> {
        let mut out = Vec::with_capacity(questions.len());
        for (idx, question) in questions.iter().enumerate() {
            tracing::debug!(
                question_id = %question.id,
                "Translating {}/{}",
                idx + 1,
                questions.len()
            );
            out.push(self.translate_question(question).await);
        }
        out
    }

    async fn translate_text(&self, text: &str) -> Option<String> {
        let user_prompt = format!("Translate this text to English:\n\n{}", text);
        match self.chat.complete(&self.system_prompt, &user_prompt).await {
            Ok(reply) => {
                let reply = unwrap_translation(&reply);
                if reply.is_empty() {
                    None
                } else {
                    Some(reply)
                }
            }
            Err(e) => {
                tracing::warn!("Translation call failed, keeping source text: {}", e);
                None
            }
        }
    }
}

fn collect_leaves<'a>(
    value: &'a mut JsonValue,
    key: Option<&str>,
    out: &mut Vec<(&'a mut String, LeafKind)>,
) {
    if key.is_some_and(|k| UNTRANSLATED_KEYS.contains(&k)) {
        return;
    }
    match value {
        JsonValue::String(s) => {
            let kind = if key.is_some_and(|k| TIME_KEYS.contains(&k)) {
                LeafKind::TimeLimit
            } else {
                LeafKind::Text
            };
            out.push((s, kind));
        }
        JsonValue::Array(items) => {
            for item in items {
                collect_leaves(item, key, out);
            }
        }
        JsonValue::Object(map) => {
            for (k, v) in map.iter_mut() {
                collect_leaves(v, Some(k.as_str()), out);
            }
        }
        _ => {}
    }
}

fn minutes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digits regex"))
}

/// Rewrites Korean minute limits without a model call. `None` means the text
/// needs a real translation.
pub fn translate_time_limit(text: &str) -> Option<String> {
    let Some(minutes) = minutes_re().find(text) else {
        return Some(text.to_string());
    };
    let minutes = minutes.as_str();
    if text.contains("분 이내") {
        Some(format!("within {} minutes", minutes))
    } else if text.contains('분') {
        Some(format!("{} minutes", minutes))
    } else if text.is_ascii() {
        Some(text.to_string())
    } else {
        None
    }
}

/// Models sometimes answer with a fenced JSON object instead of bare text.
fn unwrap_translation(reply: &str) -> String {
    let reply = reply.trim();
    if !reply.contains("```") {
        return reply.to_string();
    }

    let extraction = ExtractionService::default().extract(reply, &[]);
    if extraction.strategy != ExtractionStrategy::FencedBlock {
        return reply.to_string();
    }
    let record = extraction.record;
    WRAPPER_KEYS
        .iter()
        .filter_map(|k| record.get(*k))
        .chain(record.values())
        .find_map(|v| v.as_str().filter(|s| !s.trim().is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| reply.to_string())
}
