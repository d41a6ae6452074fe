// Analysis LLM prompt templates.

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"
Job Description: {job_description}

CV Content: {cv_text}

Analyze the match between the job description and the CV. Return a JSON object with:
- "match_percentage": integer from 0 to 100
- "similarities": list of skills and experience the CV shares with the job description
- "missing": list of requirements from the job description the CV does not show
- "course_recommendations": list of objects with "name" and "url" (a real, public course page); use "topics_to_cover" (list of strings) instead of "url" when you do not know a reliable link
"#;

/// Fills the analysis template. The template is split at the CV placeholder before
/// anything is substituted, so placeholder-like text inside either document is kept
/// verbatim.
pub fn build_analysis_prompt(job_description: &str, cv_text: &str) -> String {
    let (head, tail) = ANALYSIS_PROMPT_TEMPLATE
        .split_once("{cv_text}")
        .unwrap_or((ANALYSIS_PROMPT_TEMPLATE, ""));
    let head = head.replacen("{job_description}", job_description.trim(), 1);
    format!(
        "{}{}{}\n{}",
        head.trim_start(),
        cv_text.trim(),
        tail.trim_end(),
        crate::llm_client::prompts::JSON_OBJECT_INSTRUCTION
    )
}
