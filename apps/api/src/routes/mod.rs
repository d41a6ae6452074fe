pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        // Résumé analysis
        .route("/analyze", post(analysis::handle_analyze))
        .route("/analyze/batch", post(analysis::handle_analyze_batch))
        .route(
            "/analyze/batch/table",
            post(analysis::handle_analyze_batch_table),
        )
        // Interview prep
        .route("/get-questions", post(interview::handle_get_questions))
        .route("/ask", post(interview::handle_ask))
        // Path used by the existing web client.
        .route("/Ask", post(interview::handle_ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
