// Interview prep LLM prompt templates.

pub const QUESTION_COUNT: usize = 10;

pub const QUESTIONS_PROMPT_TEMPLATE: &str = "Based on the following job description, \
generate {count} common interview questions and their answers in the format Q: ... A: ...\n\n{job_description}";

pub fn build_questions_prompt(job_description: &str) -> String {
    QUESTIONS_PROMPT_TEMPLATE
        .replacen("{count}", &QUESTION_COUNT.to_string(), 1)
        .replacen("{job_description}", job_description.trim(), 1)
}
