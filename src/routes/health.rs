use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "generation_enabled": state.ai_service.is_some(),
        "translation_enabled": state.translation_service.is_some(),
    });
    (StatusCode::OK, Json(body))
}
