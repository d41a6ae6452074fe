use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;

/// Failure of one analysis pipeline run. None of these are retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Completion call failed: {0}")]
    Completion(#[from] LlmError),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        AppError::Analysis(AnalysisError::Extraction(e))
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Analysis(AnalysisError::Completion(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Analysis(AnalysisError::Extraction(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                e.to_string(),
            ),
            AppError::Analysis(AnalysisError::Completion(e)) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("The language model request failed: {e}"),
                )
            }
            AppError::Analysis(AnalysisError::MalformedResponse(msg)) => {
                tracing::error!("Malformed LLM response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_LLM_RESPONSE",
                    "The language model returned an unusable response".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
