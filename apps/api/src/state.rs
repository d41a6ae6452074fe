use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::CompletionClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Résumé analysis pipeline. Holds its own handles to the collaborators below.
    pub analyzer: Arc<Analyzer>,
    pub extractor: Arc<dyn TextExtractor>,
    pub llm: Arc<dyn CompletionClient>,
}
