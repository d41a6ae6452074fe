//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::batch::{run_batch, BatchEntry, BatchRun, BatchTable, CandidateDocument};
use crate::analysis::models::{FeedbackRecord, FieldSelection};
use crate::analysis::projection::ProjectedFeedback;
use crate::errors::AppError;
use crate::state::AppState;
use crate::upload::UploadForm;

const JOB_DESCRIPTION_FIELDS: &[&str] = &["job_description"];
const CV_FIELDS: &[&str] = &["cv"];
const BATCH_CV_FIELDS: &[&str] = &["cvs", "cvs[]", "cv"];
const SELECTION_FIELDS: &[&str] = &["selected", "selected[]", "selectedOptions"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub feedback: AnalyzeFeedback,
}

/// Full record by default; only the selected keys when `selected` was sent.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeFeedback {
    Full(FeedbackRecord),
    Projected(ProjectedFeedback),
}

#[derive(Debug, Serialize)]
pub struct BatchListResponse {
    pub batch_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
pub struct BatchTableResponse {
    pub batch_id: Uuid,
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub table: BatchTable,
}

struct BatchForm {
    job_description: bytes::Bytes,
    candidates: Vec<CandidateDocument>,
    selection: FieldSelection,
}

async fn read_batch_form(multipart: axum::extract::Multipart) -> Result<BatchForm, AppError> {
    let mut form = UploadForm::read(multipart).await?;

    let job_description = form
        .take_file(JOB_DESCRIPTION_FIELDS)
        .ok_or_else(|| AppError::Validation("Missing job_description file".to_string()))?
        .content;

    let candidates: Vec<CandidateDocument> = form
        .take_files(BATCH_CV_FIELDS)
        .into_iter()
        .enumerate()
        .map(|(i, file)| CandidateDocument {
            filename: file
                .filename
                .unwrap_or_else(|| format!("candidate-{}", i + 1)),
            content: file.content,
        })
        .collect();
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "At least one candidate file is required".to_string(),
        ));
    }

    let selection = read_selection(&form)?.unwrap_or(FieldSelection::All);

    Ok(BatchForm {
        job_description,
        candidates,
        selection,
    })
}

/// The caller's `selected` keys, or `None` when no key was sent.
fn read_selection(form: &UploadForm) -> Result<Option<FieldSelection>, AppError> {
    let raw_selection = form.texts(SELECTION_FIELDS);
    if raw_selection.iter().all(|s| s.trim().is_empty()) {
        return Ok(None);
    }
    FieldSelection::parse(raw_selection)
        .map(Some)
        .map_err(|e| AppError::Validation(e.to_string()))
}

async fn execute_batch(
    state: &AppState,
    form: BatchForm,
) -> Result<(BatchRun, FieldSelection), AppError> {
    let run = run_batch(
        &state.analyzer,
        form.job_description,
        form.candidates,
        state.config.batch_concurrency,
    )
    .await?;
    Ok((run, form.selection))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Multipart `job_description` + `cv`, optional `selected` keys.
/// Returns the full feedback record unless keys were selected.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: axum::extract::Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let (Some(job_description), Some(cv)) = (
        form.take_file(JOB_DESCRIPTION_FIELDS),
        form.take_file(CV_FIELDS),
    ) else {
        return Err(AppError::Validation(
            "Missing data: job_description and cv files are required".to_string(),
        ));
    };

    let feedback = match read_selection(&form)? {
        None => AnalyzeFeedback::Full(
            state
                .analyzer
                .analyze_documents(job_description.content, cv.content)
                .await?,
        ),
        Some(selection) => {
            let job_text = state.analyzer.extract(job_description.content).await?;
            let candidate_text = state.analyzer.extract(cv.content).await?;
            AnalyzeFeedback::Projected(
                state
                    .analyzer
                    .analyze(&job_text, &candidate_text, &selection)
                    .await?,
            )
        }
    };

    Ok(Json(AnalyzeResponse { feedback }))
}

/// POST /analyze/batch
///
/// Multipart `job_description`, one or more `cvs`, optional `selected` keys.
/// Per-file failures come back as `error` entries; the response is still 200.
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    multipart: axum::extract::Multipart,
) -> Result<Json<BatchListResponse>, AppError> {
    let form = read_batch_form(multipart).await?;
    let (run, selection) = execute_batch(&state, form).await?;

    Ok(Json(BatchListResponse {
        batch_id: run.batch_id,
        completed_at: run.completed_at,
        results: run.entries(&selection),
    }))
}

/// POST /analyze/batch/table
///
/// Same input as `/analyze/batch`; output is flat rows whose columns follow the
/// order of the `selected` keys.
pub async fn handle_analyze_batch_table(
    State(state): State<AppState>,
    multipart: axum::extract::Multipart,
) -> Result<Json<BatchTableResponse>, AppError> {
    let form = read_batch_form(multipart).await?;
    let (run, selection) = execute_batch(&state, form).await?;

    Ok(Json(BatchTableResponse {
        batch_id: run.batch_id,
        completed_at: run.completed_at,
        table: run.table(&selection),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{
        post_multipart, test_app, Part, ScriptedCompletion, PROSE_WRAPPED_REPLY,
    };

    fn app() -> axum::Router {
        test_app(ScriptedCompletion::always(PROSE_WRAPPED_REPLY))
    }

    #[tokio::test]
    async fn test_analyze_returns_feedback() {
        let (status, body) = post_multipart(
            app(),
            "/analyze",
            &[
                Part::file("job_description", "jd.pdf", "Senior Backend Engineer, 5 yrs Python"),
                Part::file("cv", "cv.pdf", "3 yrs Python, no cloud experience"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"]["match_percentage"], 62);
        assert_eq!(body["feedback"]["course_recommendations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_with_selection_returns_only_selected_keys() {
        let (status, body) = post_multipart(
            app(),
            "/analyze",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cv", "cv.pdf", "Python"),
                Part::text("selected", "missing,percentage"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let feedback = body["feedback"].as_object().unwrap();
        let keys: Vec<&str> = feedback.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["missing", "percentage"]);
        assert_eq!(feedback["percentage"], "62%");
    }

    #[tokio::test]
    async fn test_analyze_unknown_selection_is_400() {
        let (status, _) = post_multipart(
            app(),
            "/analyze",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cv", "cv.pdf", "Python"),
                Part::text("selected", "salary"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_completion_failure_reports_upstream_detail() {
        let app = test_app(ScriptedCompletion::always("{}").fail_when("Python", 429));
        let (status, body) = post_multipart(
            app,
            "/analyze",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cv", "cv.pdf", "3 yrs Python"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("429"));
        assert!(message.contains("scripted failure"));
    }

    #[tokio::test]
    async fn test_analyze_missing_cv_is_400() {
        let (status, body) = post_multipart(
            app(),
            "/analyze",
            &[Part::file("job_description", "jd.pdf", "Backend")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_malformed_reply_is_502() {
        let app = test_app(ScriptedCompletion::always("Looks good to me!"));
        let (status, body) = post_multipart(
            app,
            "/analyze",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cv", "cv.pdf", "Python"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "MALFORMED_LLM_RESPONSE");
    }

    #[tokio::test]
    async fn test_batch_partial_failure_is_200_with_error_entry() {
        let (status, body) = post_multipart(
            app(),
            "/analyze/batch",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cvs", "one.pdf", "Python"),
                Part::file("cvs", "two.pdf", "%CORRUPT"),
                Part::file("cvs", "three.pdf", "Go"),
                Part::text("selected", "percentage,missing"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["filename"], "one.pdf");
        assert_eq!(results[0]["feedback"]["percentage"], "62%");
        assert!(results[0]["feedback"].get("courses").is_none());
        assert_eq!(results[1]["filename"], "two.pdf");
        assert!(results[1]["error"].is_string());
        assert!(results[2]["feedback"].is_object());
        assert!(body["batch_id"].is_string());
    }

    #[tokio::test]
    async fn test_batch_without_candidates_is_400() {
        let (status, _) = post_multipart(
            app(),
            "/analyze/batch",
            &[Part::file("job_description", "jd.pdf", "Backend")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_without_job_description_is_400() {
        let (status, _) = post_multipart(
            app(),
            "/analyze/batch",
            &[Part::file("cvs", "one.pdf", "Python")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_unknown_field_key_is_400() {
        let (status, body) = post_multipart(
            app(),
            "/analyze/batch",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cvs", "one.pdf", "Python"),
                Part::text("selected", "salary"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("salary"));
    }

    #[tokio::test]
    async fn test_batch_unreadable_job_description_is_422() {
        let (status, body) = post_multipart(
            app(),
            "/analyze/batch",
            &[
                Part::file("job_description", "jd.pdf", "%CORRUPT"),
                Part::file("cvs", "one.pdf", "Python"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_table_columns_follow_selection_order() {
        let (status, body) = post_multipart(
            app(),
            "/analyze/batch/table",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cvs", "one.pdf", "Python"),
                Part::file("cvs", "two.pdf", "%CORRUPT"),
                Part::text("selected", "missing"),
                Part::text("selected", "percentage"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["filename", "missing", "percentage"]));
        assert_eq!(
            body["rows"][1],
            json!({"filename": "two.pdf", "missing": "Error", "percentage": "Error"})
        );
        assert_eq!(body["rows"][0]["percentage"], "62%");
    }

    #[tokio::test]
    async fn test_batch_table_defaults_to_all_columns() {
        let (status, body) = post_multipart(
            app(),
            "/analyze/batch/table",
            &[
                Part::file("job_description", "jd.pdf", "Backend"),
                Part::file("cvs", "one.pdf", "Python"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["columns"],
            json!(["filename", "percentage", "similarities", "missing", "courses"])
        );
    }
}
