//! Interview question generation and the single-turn career Q&A.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AnalysisError;
use crate::interview::prompts::build_questions_prompt;
use crate::llm_client::prompts::ASSISTANT_SYSTEM;
use crate::llm_client::{CompletionClient, CompletionRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Parses `Q: … A: …` text into pairs.
///
/// `Q:` starts a new pair, `A:` sets the answer, and any other line continues the
/// current answer. A pair is kept only when both sides are non-empty.
pub fn parse_qa_pairs(text: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut question = String::new();
    let mut answer = String::new();

    let mut flush = |question: &mut String, answer: &mut String| {
        let q = question.trim();
        let a = answer.trim();
        if !q.is_empty() && !a.is_empty() {
            pairs.push(QaPair {
                question: q.to_string(),
                answer: a.to_string(),
            });
        }
        question.clear();
        answer.clear();
    };

    for line in text.lines() {
        let line = line.trim();
        if let Some(q) = line.strip_prefix("Q:") {
            flush(&mut question, &mut answer);
            question.push_str(q.trim());
        } else if let Some(a) = line.strip_prefix("A:") {
            answer.clear();
            answer.push_str(a.trim());
        } else if !line.is_empty() && !question.is_empty() {
            answer.push(' ');
            answer.push_str(line);
        }
    }
    flush(&mut question, &mut answer);

    pairs
}

/// Asks the model for interview questions about an extracted job description.
pub async fn generate_questions(
    llm: &dyn CompletionClient,
    model: &str,
    job_description: &str,
) -> Result<Vec<QaPair>, AnalysisError> {
    let prompt = build_questions_prompt(job_description);
    let reply = llm
        .complete(CompletionRequest {
            system: ASSISTANT_SYSTEM,
            prompt: &prompt,
            model,
            max_tokens: None,
            temperature: None,
        })
        .await?;

    let pairs = parse_qa_pairs(&reply);
    info!("Generated {} interview question(s)", pairs.len());
    Ok(pairs)
}

/// Single-turn question. No conversation state is kept between calls.
pub async fn ask(
    llm: &dyn CompletionClient,
    model: &str,
    question: &str,
) -> Result<String, AnalysisError> {
    let answer = llm
        .complete(CompletionRequest {
            system: ASSISTANT_SYSTEM,
            prompt: question.trim(),
            model,
            max_tokens: None,
            temperature: None,
        })
        .await?;
    Ok(answer.trim().to_string())
}
