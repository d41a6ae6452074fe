//! Axum route handlers for interview prep.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::questions::{ask, generate_questions, QaPair};
use crate::state::AppState;
use crate::upload::UploadForm;

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<QaPair>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /get-questions
///
/// Multipart `file` holding a job description.
pub async fn handle_get_questions(
    State(state): State<AppState>,
    multipart: axum::extract::Multipart,
) -> Result<Json<QuestionsResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form
        .take_file(&["file"])
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    let job_description = state.extractor.extract(file.content).await?;
    let questions = generate_questions(
        state.llm.as_ref(),
        &state.config.completion_model,
        &job_description,
    )
    .await?;

    Ok(Json(QuestionsResponse { questions }))
}

/// POST /ask
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = request
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No question provided".to_string()))?;

    let answer = ask(state.llm.as_ref(), &state.config.completion_model, &question).await?;
    Ok(Json(AskResponse { answer }))
}
