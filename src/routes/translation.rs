use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::bank_dto::TranslateBatchPayload,
    error::{Error, Result},
    models::question::QuestionRecord,
    services::translation_service::TranslationService,
    AppState,
};

fn translator(state: &AppState) -> Result<&TranslationService> {
    state.translation_service.as_ref().ok_or_else(|| {
        Error::Unavailable("set OPENAI_API_KEY to enable translation".to_string())
    })
}

async fn load_question(state: &AppState, id: &str) -> Result<QuestionRecord> {
    state
        .questions
        .get_question(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Question {} not found", id)))
}

#[axum::debug_handler]
pub async fn translate_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse> {
    let translator = translator(&state)?;
    let question = load_question(&state, &question_id).await?;

    Ok(Json(translator.translate_question(&question).await))
}

#[axum::debug_handler]
pub async fn translate_batch(
    State(state): State<AppState>,
    Json(payload): Json<TranslateBatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let translator = translator(&state)?;

    let mut questions = Vec::with_capacity(payload.question_ids.len());
    for id in &payload.question_ids {
        questions.push(load_question(&state, id).await?);
    }

    let items = translator.translate_batch(&questions).await;
    Ok(Json(json!({
        "total": items.len(),
        "items": items,
    })))
}
