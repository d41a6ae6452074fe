//! Single-Item Analyzer: one (job description, résumé) pair through the pipeline.
//!
//! Flow: extract text → build prompt → completion call → parse + validate links →
//! (optional) projection.
//!
//! Every failure is terminal for the call and propagated as-is; there are no
//! partial records and no retries here.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::analysis::feedback_parser::parse_feedback;
use crate::analysis::models::{FeedbackRecord, FieldSelection};
use crate::analysis::projection::{project, ProjectedFeedback, RenderMode};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::url_validator::UrlValidator;
use crate::errors::AnalysisError;
use crate::extraction::TextExtractor;
use crate::llm_client::prompts::ASSISTANT_SYSTEM;
use crate::llm_client::{CompletionClient, CompletionRequest};

pub struct Analyzer {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn CompletionClient>,
    url_validator: Arc<dyn UrlValidator>,
    model: String,
}

impl Analyzer {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn CompletionClient>,
        url_validator: Arc<dyn UrlValidator>,
        model: String,
    ) -> Self {
        Self {
            extractor,
            llm,
            url_validator,
            model,
        }
    }

    pub async fn extract(&self, document: Bytes) -> Result<String, AnalysisError> {
        Ok(self.extractor.extract(document).await?)
    }

    /// Full feedback record for already-extracted texts.
    pub async fn feedback(
        &self,
        job_text: &str,
        candidate_text: &str,
    ) -> Result<FeedbackRecord, AnalysisError> {
        let prompt = build_analysis_prompt(job_text, candidate_text);
        let reply = self
            .llm
            .complete(CompletionRequest {
                system: ASSISTANT_SYSTEM,
                prompt: &prompt,
                model: &self.model,
                max_tokens: None,
                temperature: None,
            })
            .await?;

        let record = parse_feedback(&reply, self.url_validator.as_ref()).await?;
        info!(
            "Analysis complete: match={:?}, similarities={}, missing={}, courses={}",
            record.match_percentage,
            record.similarities.len(),
            record.missing.len(),
            record.course_recommendations.len()
        );
        Ok(record)
    }

    /// Analysis of extracted texts, projected to the caller's fields.
    pub async fn analyze(
        &self,
        job_text: &str,
        candidate_text: &str,
        selection: &FieldSelection,
    ) -> Result<ProjectedFeedback, AnalysisError> {
        let record = self.feedback(job_text, candidate_text).await?;
        Ok(project(&record, selection, RenderMode::Json))
    }

    /// Extracts both documents and analyzes the pair with every field.
    pub async fn analyze_documents(
        &self,
        job_description: Bytes,
        candidate: Bytes,
    ) -> Result<FeedbackRecord, AnalysisError> {
        let job_text = self.extract(job_description).await?;
        let candidate_text = self.extract(candidate).await?;
        self.feedback(&job_text, &candidate_text).await
    }
}
