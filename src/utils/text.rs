//! Cleanup helpers for showing generated questions to reviewers.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use crate::models::question::{QuestionRecord, QuestionType};

pub const UNTITLED: &str = "Untitled";
pub const NO_ANSWER: &str = "No answer information";

fn key_hint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)(?:^|\b)(?:key|keyboard)\s*[:=]?\s*(?:arrow(?:left|right|up|down)|[-\w,\s])+")
            .expect("valid key hint regex")
    })
}

fn key_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:key|keyboard)\s*[:=].*\n?").expect("valid key line regex")
    })
}

fn arrow_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bkeyboard_arrow_(left|right|up|down)\b").expect("valid arrow regex")
    })
}

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// One-line title without keyboard hint tokens.
pub fn sanitize_title(raw: &str) -> String {
    if raw.trim().is_empty() {
        return UNTITLED.to_string();
    }

    let stripped = key_hint_re().replace_all(raw, "");
    let first_line = stripped.trim().lines().next().unwrap_or("");
    let mut text = whitespace_re().replace_all(first_line, " ").trim().to_string();

    if text.chars().count() < 5 {
        text = raw.trim().replace('\n', " ").chars().take(50).collect();
    }

    if text.is_empty() {
        UNTITLED.to_string()
    } else {
        text
    }
}

/// Body text without HTML tags or keyboard hints, whitespace collapsed.
pub fn sanitize_content(raw: &str) -> String {
    let text = html_tag_re().replace_all(raw, "");
    let text = key_line_re().replace_all(&text, "");
    let text = arrow_token_re().replace_all(&text, "");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}

/// Reference answer shown next to a question in review lists.
pub fn extract_answer(question: &QuestionRecord) -> String {
    let metadata = &question.metadata;
    let answer = match question.question_type {
        QuestionType::MultipleChoice => metadata
            .get("steps")
            .and_then(JsonValue::as_array)
            .and_then(|steps| {
                steps
                    .iter()
                    .filter_map(|step| step.get("answer"))
                    .find(|a| !a.is_null() && a.as_str() != Some(""))
            })
            .map(value_text),
        QuestionType::Subjective => match metadata.get("evaluation") {
            Some(JsonValue::Array(items)) => items.first().map(value_text),
            Some(JsonValue::Null) | None => None,
            Some(other) => Some(value_text(other)),
        },
    };
    answer.unwrap_or_else(|| NO_ANSWER.to_string())
}

fn value_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
