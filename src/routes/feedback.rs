use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::bank_dto::FeedbackPayload,
    error::{Error, Result},
    models::feedback::Feedback,
    AppState,
};

#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let feedback = Feedback::from(payload);
    let question_id = feedback.question_id.clone();
    state.hitl_service.submit_feedback(feedback).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "question_id": question_id, "status": "recorded" })),
    ))
}

pub async fn feedback_stats(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse> {
    let stats = state
        .hitl_service
        .feedback_stats(&question_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No feedback for question {}", question_id)))?;
    Ok(Json(stats))
}

pub async fn difficulty_analysis(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state.hitl_service.analyze_question(&question_id).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn auto_adjust(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let adjustments = state.hitl_service.auto_adjust_all().await?;
    Ok(Json(json!({
        "adjusted": adjustments.len(),
        "adjustments": adjustments,
    })))
}

pub async fn list_adjustments(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let history = state.hitl_service.adjustment_history().await?;
    Ok(Json(json!({
        "adjustments": history.adjustments,
        "feedback_count": history.feedback_count,
        "adjustment_count": history.adjustment_count,
    })))
}
