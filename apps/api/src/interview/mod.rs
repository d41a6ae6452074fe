// Interview prep: question/answer generation from a job description and
// single-turn career questions. No conversation state is kept.

pub mod handlers;
pub mod prompts;
pub mod questions;
