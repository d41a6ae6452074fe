// Résumé analysis: one job description against one or many résumés.
// All LLM calls go through llm_client; all link checks through url_validator.

pub mod analyzer;
pub mod batch;
pub mod feedback_parser;
pub mod handlers;
pub mod models;
pub mod projection;
pub mod prompts;
pub mod url_validator;
