use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    dto::bank_dto::{ExtractPayload, ExtractResponse},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn extract(
    State(state): State<AppState>,
    Json(payload): Json<ExtractPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let fields = payload.required_fields();
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let extraction = state.extraction_service.extract(&payload.raw_text, &fields);

    Ok(Json(ExtractResponse {
        strategy: extraction.strategy,
        is_stub: extraction.is_stub(),
        record: extraction.into_value(),
    }))
}
