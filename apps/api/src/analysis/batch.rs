//! Batch Analyzer: one job description against many résumés.
//!
//! Per file: EXTRACTING → ANALYZING → DONE | FAILED. A failed file becomes an
//! error entry in its own slot and never stops the files after it. The batch as a
//! whole only fails when the job description itself cannot be extracted.
//!
//! Files run on an order-preserving stream (`buffered`), so the output order is
//! the input order regardless of concurrency.

use std::time::Instant;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::models::{FeedbackRecord, FieldSelection};
use crate::analysis::projection::{project, ProjectedFeedback, RenderMode};
use crate::errors::AnalysisError;

/// Cell value for every selected column of a failed file.
pub const ERROR_CELL: &str = "Error";

/// An uploaded résumé, referenced by its filename.
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    pub filename: String,
    pub content: Bytes,
}

/// Outcome of one file, in its input slot.
#[derive(Debug)]
pub struct FileOutcome {
    pub filename: String,
    pub result: Result<FeedbackRecord, AnalysisError>,
}

#[derive(Debug)]
pub struct BatchRun {
    pub batch_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub outcomes: Vec<FileOutcome>,
}

/// List-mode entry. Exactly one of `feedback` / `error` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Feedback {
        filename: String,
        feedback: ProjectedFeedback,
    },
    Error {
        filename: String,
        error: String,
    },
}

#[cfg(test)]
impl BatchEntry {
    pub fn filename(&self) -> &str {
        match self {
            BatchEntry::Feedback { filename, .. } | BatchEntry::Error { filename, .. } => filename,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BatchEntry::Error { .. })
    }
}

/// Table-mode output. Every row starts with `filename`, then one cell per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTable {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Runs every candidate against the job description.
pub async fn run_batch(
    analyzer: &Analyzer,
    job_description: Bytes,
    candidates: Vec<CandidateDocument>,
    concurrency: usize,
) -> Result<BatchRun, AnalysisError> {
    let batch_id = Uuid::new_v4();
    let total = candidates.len();
    info!("Batch {batch_id}: {total} candidate(s), concurrency {concurrency}");

    let job_text = analyzer.extract(job_description).await.map_err(|e| {
        warn!("Batch {batch_id}: job description unusable: {e}");
        e
    })?;
    let job_text = job_text.as_str();

    let outcomes: Vec<FileOutcome> = stream::iter(candidates.into_iter().enumerate())
        .map(|(index, doc)| analyze_file(analyzer, job_text, batch_id, index, total, doc))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "Batch {batch_id} complete: {} succeeded, {failed} failed",
        total - failed
    );

    Ok(BatchRun {
        batch_id,
        completed_at: Utc::now(),
        outcomes,
    })
}

async fn analyze_file(
    analyzer: &Analyzer,
    job_text: &str,
    batch_id: Uuid,
    index: usize,
    total: usize,
    doc: CandidateDocument,
) -> FileOutcome {
    let started = Instant::now();
    let CandidateDocument { filename, content } = doc;

    let result = async {
        let candidate_text = analyzer.extract(content).await?;
        analyzer.feedback(job_text, &candidate_text).await
    }
    .await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => info!(
            %batch_id,
            filename = %filename,
            elapsed_ms,
            "File {}/{} done",
            index + 1,
            total
        ),
        Err(e) => warn!(
            %batch_id,
            filename = %filename,
            elapsed_ms,
            "File {}/{} failed: {e}",
            index + 1,
            total
        ),
    }

    FileOutcome { filename, result }
}

impl BatchRun {
    /// List mode: one entry per file, feedback projected in JSON mode.
    pub fn entries(&self, selection: &FieldSelection) -> Vec<BatchEntry> {
        self.outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(record) => BatchEntry::Feedback {
                    filename: outcome.filename.clone(),
                    feedback: project(record, selection, RenderMode::Json),
                },
                Err(e) => BatchEntry::Error {
                    filename: outcome.filename.clone(),
                    error: e.to_string(),
                },
            })
            .collect()
    }

    /// Table mode: flat string rows, columns in selection order.
    pub fn table(&self, selection: &FieldSelection) -> BatchTable {
        let keys = selection.keys();
        let mut columns = vec!["filename".to_string()];
        columns.extend(keys.iter().map(|k| k.as_str().to_string()));

        let rows = self
            .outcomes
            .iter()
            .map(|outcome| {
                let mut row = Map::new();
                row.insert(
                    "filename".to_string(),
                    Value::String(outcome.filename.clone()),
                );
                match &outcome.result {
                    Ok(record) => row.extend(project(record, selection, RenderMode::Table)),
                    Err(_) => {
                        for key in &keys {
                            row.insert(
                                key.as_str().to_string(),
                                Value::String(ERROR_CELL.to_string()),
                            );
                        }
                    }
                }
                row
            })
            .collect();

        BatchTable { columns, rows }
    }
}
