use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::bank_dto::{GenerateQuestionPayload, QuestionSummary, SaveQuestionPayload},
    error::{Error, Result},
    models::question::{QuestionFilter, QuestionRecord},
    AppState,
};

#[axum::debug_handler]
pub async fn generate_question(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let ai = state.ai_service.as_ref().ok_or_else(|| {
        Error::Unavailable("set OPENAI_API_KEY to enable question generation".to_string())
    })?;

    let output = ai
        .generate_question(
            &payload.area,
            &payload.difficulty,
            payload.question_type,
            payload.context.as_deref(),
        )
        .await?;

    // Stub records are only useful for review, never for the bank.
    let saved = payload.save && !output.is_stub;
    if saved {
        state.questions.save_question(output.question.clone()).await?;
    }

    Ok(Json(json!({
        "question": output.question,
        "raw_content": output.raw_content,
        "strategy": output.strategy,
        "is_stub": output.is_stub,
        "saved": saved,
        "logs": output.logs,
    })))
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<SaveQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let question = QuestionRecord::from(payload);
    state.questions.save_question(question.clone()).await?;
    tracing::info!(id = %question.id, "Question saved");

    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn list_questions(
    State(state): State<AppState>,
    Query(filter): Query<QuestionFilter>,
) -> Result<impl IntoResponse> {
    let questions = state.questions.list_questions(filter).await?;
    let items: Vec<QuestionSummary> = questions.iter().map(QuestionSummary::from).collect();
    Ok(Json(json!({
        "total": items.len(),
        "items": items,
    })))
}
