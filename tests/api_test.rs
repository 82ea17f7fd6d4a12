use assessment_bank::{
    build_router,
    config::Config,
    database::memory::MemoryBank,
    error::{Error, Result},
    services::chat_client::ChatModel,
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    build_router(AppState::new(&Config::local("127.0.0.1:0")).unwrap())
}

/// Answers every prompt with the text after the prompt's blank line, bracketed.
struct BracketChat;

#[async_trait]
impl ChatModel for BracketChat {
    fn model_name(&self) -> String {
        "bracket".to_string()
    }

    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        match user_prompt.rsplit("\n\n").next() {
            Some("FAIL") => Err(Error::Model("refused".to_string())),
            Some(text) => Ok(format!("[{}]", text)),
            None => Ok(String::new()),
        }
    }
}

fn app_with_chat() -> Router {
    let bank = MemoryBank::new();
    let state = AppState::with_chat(
        Arc::new(bank.clone()),
        Arc::new(bank),
        Some(Arc::new(BracketChat)),
        &Config::local("127.0.0.1:0"),
    )
    .unwrap();
    build_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn feedback(rating: u8, vote: &str) -> JsonValue {
    json!({
        "question_id": "Q_SUBJ_1",
        "user_id": "reviewer",
        "difficulty_rating": rating,
        "relevance_rating": 4,
        "clarity_rating": 5,
        "comments": "ok",
        "actual_difficulty": vote
    })
}

#[tokio::test]
async fn health_reports_generation_disabled() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generation_enabled"], false);
    assert_eq!(body["translation_enabled"], false);
}

#[tokio::test]
async fn extract_endpoint_reports_strategy() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/extract",
        Some(json!({
            "raw_text": "```json\n{\"title\": \"T\", \"task\": \"do\",}\n```",
            "type": "subjective"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "fenced_block");
    assert_eq!(body["is_stub"], false);
    assert_eq!(body["record"], json!({"title": "T", "task": "do"}));

    let (_, body) = send(
        &app,
        "POST",
        "/api/extract",
        Some(json!({"raw_text": "hello world", "required_fields": ["title"]})),
    )
    .await;
    assert_eq!(body["strategy"], "stub");
    assert_eq!(body["record"], json!({"title": "hello world"}));
}

#[tokio::test]
async fn generation_without_api_key_is_unavailable() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/questions/generate",
        Some(json!({"area": "news", "difficulty": "easy", "type": "subjective"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("OPENAI_API_KEY"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/questions/generate",
        Some(json!({"area": "sports", "difficulty": "easy", "type": "subjective"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feedback_validation_and_unknown_question() {
    let app = app();

    let mut bad = feedback(9, "advanced");
    bad["question_id"] = json!("missing");
    let (status, _) = send(&app, "POST", "/api/feedback", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unknown = feedback(3, "advanced");
    unknown["question_id"] = json!("missing");
    let (status, body) = send(&app, "POST", "/api/feedback", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("missing"));

    let (status, _) = send(&app, "GET", "/api/questions/missing/difficulty-analysis", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_loop_end_to_end() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/questions",
        Some(json!({
            "id": "Q_SUBJ_1",
            "area": "interview",
            "difficulty": "basic",
            "type": "subjective",
            "question": "Prepare a market brief keyboard_arrow_right",
            "metadata": {
                "scenario": "<p>Launch  plan</p>",
                "evaluation": ["Accuracy 40%", "Clarity 60%"]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/questions",
        Some(json!({
            "id": "Q_SUBJ_1",
            "area": "interview",
            "difficulty": "basic",
            "type": "subjective",
            "question": "duplicate"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/feedback", Some(feedback(5, "advanced"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/api/questions/Q_SUBJ_1/difficulty-analysis", None).await;
    assert_eq!(body["status"], "insufficient_data");
    assert_eq!(body["feedback_count"], 1);

    for (rating, vote) in [(5, "advanced"), (4, "advanced")] {
        send(&app, "POST", "/api/feedback", Some(feedback(rating, vote))).await;
    }

    let (status, body) = send(&app, "GET", "/api/questions/Q_SUBJ_1/feedback-stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feedback_count"], 3);
    assert_eq!(body["difficulty_votes"]["advanced"], 3);

    let (_, body) = send(&app, "GET", "/api/questions/Q_SUBJ_1/difficulty-analysis", None).await;
    assert_eq!(body["status"], "analyzed");
    assert_eq!(body["recommended_difficulty"], "advanced");
    assert_eq!(body["needs_adjustment"], true);

    let (status, body) = send(&app, "POST", "/api/difficulty/auto-adjust", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjusted"], 1);
    assert_eq!(body["adjustments"][0]["from"], "basic");
    assert_eq!(body["adjustments"][0]["to"], "advanced");

    let (_, body) = send(&app, "GET", "/api/difficulty/adjustments", None).await;
    assert_eq!(body["adjustment_count"], 1);
    assert_eq!(body["feedback_count"], 3);
    assert_eq!(body["adjustments"][0]["adjusted_by"], "auto_system");

    let (_, body) = send(&app, "GET", "/api/questions?type=subjective&area=interview", None).await;
    assert_eq!(body["total"], 1);
    let item = &body["items"][0];
    assert_eq!(item["difficulty"], "advanced");
    assert_eq!(item["title"], "Prepare a market brief");
    assert_eq!(item["preview"], "Launch plan");
    assert_eq!(item["answer"], "Accuracy 40%");

    let (_, body) = send(&app, "GET", "/api/questions?type=multiple_choice", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn translation_without_api_key_is_unavailable() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/questions/Q1/translate", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("translation"));
}

#[tokio::test]
async fn translate_endpoints_rewrite_stored_questions() {
    let app = app_with_chat();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["translation_enabled"], true);

    for (id, task) in [("Q_KR_1", "시장 분석"), ("Q_KR_2", "FAIL")] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/questions",
            Some(json!({
                "id": id,
                "area": "news",
                "difficulty": "easy",
                "type": "subjective",
                "question": "뉴스 요약",
                "metadata": {"lang": "kr", "task": task, "time_limit": "10분 이내"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "POST", "/api/questions/Q_KR_1/translate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_question_id"], "Q_KR_1");
    assert_eq!(body["lang"], "en");
    assert_eq!(body["question"]["question"], "[뉴스 요약]");
    assert_eq!(body["question"]["metadata"]["task"], "[시장 분석]");
    assert_eq!(body["question"]["metadata"]["time_limit"], "within 10 minutes");
    assert_eq!(body["question"]["metadata"]["lang"], "en");

    let (status, _) = send(&app, "POST", "/api/questions/missing/translate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/questions/translate-batch",
        Some(json!({"question_ids": ["Q_KR_1", "Q_KR_2"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][1]["question"]["metadata"]["task"], "FAIL");
    assert_eq!(body["items"][1]["failed_fields"], 1);

    let (status, _) = send(
        &app,
        "POST",
        "/api/questions/translate-batch",
        Some(json!({"question_ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
