//! Question answering endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use scalpel_common::{AnswerResult, ApiError};
use serde::Deserialize;

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default, alias = "pergunta")]
    pub question: Option<String>,
}

/// POST /ask: `{"question": "..."}` in, `{"answer": "...", "citations": "..."}` out.
pub async fn ask(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let result = state.pipeline.ask(req.question.as_deref()).await?;
    Ok(Json(result))
}
