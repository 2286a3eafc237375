use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// The three pipeline stages that call an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    Embed,
    Synthesize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize  => "normalize",
            Stage::Embed      => "embed",
            Stage::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or empty question. Raised before any external call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream service error during {stage}: {message}")]
    Upstream { stage: Stage, message: String },

    /// Startup only: unreadable corpus files or record/vector count mismatch.
    #[error("Index integrity error: {0}")]
    IndexIntegrity(String),
}

impl PipelineError {
    pub fn upstream(stage: Stage, err: impl fmt::Display) -> Self {
        PipelineError::Upstream { stage, message: err.to_string() }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        PipelineError::IndexIntegrity(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ── HTTP mapping ──────────────────────────────────────────────────────────────

/// Error returned by web handlers. Upstream details never reach the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("upstream service unavailable")]
    Upstream,

    #[error("internal server error")]
    Internal,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            PipelineError::Upstream { stage, message } => {
                tracing::error!(stage = stage.as_str(), error = %message, "upstream call failed");
                ApiError::Upstream
            }
            PipelineError::IndexIntegrity(msg) => {
                tracing::error!(error = %msg, "index integrity failure at request time");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream      => StatusCode::BAD_GATEWAY,
            ApiError::Internal      => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
