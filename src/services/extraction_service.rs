//! Best-effort recovery of a JSON question record from raw model text.
//!
//! Strategies run in order and the first one that yields an acceptable record
//! wins: direct parse, fenced code block, greedy brace span, field scraping.
//! When nothing usable is found the caller gets a stub `{"title": raw}`.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

pub type JsonMap = Map<String, JsonValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    DirectParse,
    FencedBlock,
    BraceSpan,
    FieldScrape,
    Stub,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: JsonMap,
    pub strategy: ExtractionStrategy,
}

impl Extraction {
    pub fn is_stub(&self) -> bool {
        self.strategy == ExtractionStrategy::Stub
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.record)
    }
}

/// Values used by field scraping for fields the text did not contain.
#[derive(Debug, Clone)]
pub struct ScrapeDefaults {
    pub difficulty: String,
    pub category: String,
    pub estimated_time: String,
}

impl Default for ScrapeDefaults {
    fn default() -> Self {
        Self {
            difficulty: "normal".to_string(),
            category: "general".to_string(),
            estimated_time: "5 minutes".to_string(),
        }
    }
}

type Strategy = fn(&ExtractionService, &str, &[&str]) -> Option<JsonMap>;

const STRATEGIES: [(ExtractionStrategy, Strategy); 4] = [
    (ExtractionStrategy::DirectParse, ExtractionService::direct_parse),
    (ExtractionStrategy::FencedBlock, ExtractionService::fenced_block),
    (ExtractionStrategy::BraceSpan, ExtractionService::brace_span),
    (ExtractionStrategy::FieldScrape, ExtractionService::field_scrape),
];

const SCRAPED_FIELDS: [&str; 6] = [
    "title",
    "problemTitle",
    "task",
    "scenario",
    "difficulty",
    "category",
];

#[derive(Clone, Default)]
pub struct ExtractionService {
    defaults: ScrapeDefaults,
}

impl ExtractionService {
    pub fn new(defaults: ScrapeDefaults) -> Self {
        Self { defaults }
    }

    /// Never fails: the worst case is a stub record holding the raw text.
    pub fn extract(&self, raw: &str, required_fields: &[&str]) -> Extraction {
        for (strategy, run) in STRATEGIES {
            if let Some(record) = run(self, raw, required_fields) {
                tracing::debug!(?strategy, fields = record.len(), "Model output extracted");
                return Extraction { record, strategy };
            }
        }

        tracing::warn!(
            raw_len = raw.len(),
            "No structured record found in model output; using stub"
        );
        let mut record = JsonMap::new();
        record.insert("title".to_string(), JsonValue::String(raw.to_string()));
        Extraction {
            record,
            strategy: ExtractionStrategy::Stub,
        }
    }

    fn direct_parse(&self, raw: &str, _required: &[&str]) -> Option<JsonMap> {
        match serde_json::from_str::<JsonValue>(raw.trim()) {
            Ok(JsonValue::Object(map)) => Some(map),
            _ => None,
        }
    }

    fn fenced_block(&self, raw: &str, required: &[&str]) -> Option<JsonMap> {
        let caps = fence_re().captures(raw)?;
        parse_candidate(caps.get(1)?.as_str(), required)
    }

    fn brace_span(&self, raw: &str, required: &[&str]) -> Option<JsonMap> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end <= start {
            return None;
        }
        parse_candidate(&raw[start..=end], required)
    }

    fn field_scrape(&self, raw: &str, required: &[&str]) -> Option<JsonMap> {
        let mut record = JsonMap::new();

        for field in SCRAPED_FIELDS {
            if let Some(value) = scrape_string(raw, field) {
                record.insert(field.to_string(), JsonValue::String(value));
            }
        }

        if let Some(value) = scrape_string(raw, "estimatedTime") {
            record.insert("estimatedTime".to_string(), JsonValue::String(value));
        } else if let Some(value) = scrape_string(raw, "time_limit") {
            record.insert("time_limit".to_string(), JsonValue::String(value));
        } else {
            record.insert(
                "estimatedTime".to_string(),
                JsonValue::String(self.defaults.estimated_time.clone()),
            );
        }

        record
            .entry("difficulty")
            .or_insert_with(|| JsonValue::String(self.defaults.difficulty.clone()));
        record
            .entry("category")
            .or_insert_with(|| JsonValue::String(self.defaults.category.clone()));

        let steps = scrape_steps(raw);
        if steps.is_some() || required.contains(&"steps") {
            record.insert(
                "steps".to_string(),
                JsonValue::Array(steps.unwrap_or_default()),
            );
        }

        if record.contains_key(primary_title_field(required)) {
            Some(record)
        } else {
            None
        }
    }
}

/// The headline key that decides whether scraping found a real question.
fn primary_title_field<'a>(required: &[&'a str]) -> &'a str {
    required
        .iter()
        .copied()
        .find(|f| *f == "problemTitle" || *f == "title")
        .unwrap_or("title")
}

fn parse_candidate(candidate: &str, required: &[&str]) -> Option<JsonMap> {
    let cleaned = strip_trailing_commas(candidate);
    match serde_json::from_str::<JsonValue>(&cleaned) {
        Ok(JsonValue::Object(map)) if required.iter().all(|f| map.contains_key(*f)) => Some(map),
        _ => None,
    }
}

/// Drop commas that directly precede a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    trailing_comma_re().replace_all(text, "$1").into_owned()
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fence regex"))
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid comma regex"))
}

fn steps_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""steps"\s*:\s*\["#).expect("valid steps regex"))
}

/// Reads `"field": "<value>"` up to the next unescaped quote.
fn scrape_string(raw: &str, field: &str) -> Option<String> {
    let anchor = Regex::new(&format!(r#""{}"\s*:\s*""#, regex::escape(field))).ok()?;
    let start = anchor.find(raw)?.end();
    let rest = &raw[start..];

    let mut escaped = false;
    let mut end = None;
    for (idx, ch) in rest.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                end = Some(idx);
                break;
            }
            _ => {}
        }
    }

    let body = &rest[..end?];
    let value = serde_json::from_str::<String>(&format!("\"{}\"", body))
        .unwrap_or_else(|_| body.to_string());
    Some(value)
}

/// Locates the `"steps": [...]` array by bracket matching and parses it alone.
/// `Some(vec![])` when the array exists but cannot be recovered.
fn scrape_steps(raw: &str) -> Option<Vec<JsonValue>> {
    let open = steps_re().find(raw)?.end() - 1;
    let Some(close) = matching_bracket(raw, open) else {
        return Some(Vec::new());
    };

    let cleaned = strip_trailing_commas(&raw[open..=close]);
    match serde_json::from_str::<JsonValue>(&cleaned) {
        Ok(JsonValue::Array(items)) => Some(items),
        _ => Some(Vec::new()),
    }
}

/// Byte index of the `]` closing the `[` at `open`, skipping string contents.
fn matching_bracket(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (ch == ']').then_some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}
