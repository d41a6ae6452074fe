//! Feedback Parser: the single conversion from an untrusted LLM reply into a
//! `FeedbackRecord`.
//!
//! The reply is free text. The payload is taken to be the span from the first `{`
//! to the last `}`; anything outside it is ignored. A reply without such a span,
//! or whose span does not deserialize, is `MalformedResponse`. There is no retry
//! and no default record.
//!
//! Everything downstream trusts the record this module returns.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::analysis::models::{CourseRecommendation, FeedbackRecord};
use crate::analysis::url_validator::UrlValidator;
use crate::errors::AnalysisError;

/// Longest reply excerpt written to the logs for a malformed reply.
const LOG_EXCERPT_CHARS: usize = 300;

/// Link checks in flight at once for one reply.
const LINK_CHECK_CONCURRENCY: usize = 8;

// ────────────────────────────────────────────────────────────────────────────
// Wire shape of the LLM reply (lenient)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawFeedback {
    #[serde(default)]
    match_percentage: Option<RawPercentage>,
    #[serde(default, deserialize_with = "string_list")]
    similarities: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    missing: Vec<String>,
    #[serde(default)]
    course_recommendations: Option<Vec<RawCourse>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPercentage {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    topics_to_cover: Vec<String>,
}

/// Accepts `null`, a single string, or a list of strings. Blank entries are dropped.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => vec![],
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────────────────

/// Parsed reply whose course links have not been checked yet.
#[derive(Debug)]
struct UncheckedFeedback {
    match_percentage: Option<u8>,
    similarities: Vec<String>,
    missing: Vec<String>,
    courses: Vec<CourseRecommendation>,
}

/// Returns the span from the first `{` to the last `}` inclusive, if any.
pub fn extract_json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn excerpt(reply: &str) -> String {
    let mut out: String = reply.chars().take(LOG_EXCERPT_CHARS).collect();
    if reply.chars().count() > LOG_EXCERPT_CHARS {
        out.push('…');
    }
    out
}

fn malformed(reason: String, reply: &str) -> AnalysisError {
    warn!(
        "Malformed LLM reply ({reason}); excerpt: {:?}",
        excerpt(reply)
    );
    AnalysisError::MalformedResponse(reason)
}

fn normalize_percentage(raw: RawPercentage) -> Result<u8, String> {
    let value = match raw {
        RawPercentage::Number(n) => n,
        RawPercentage::Text(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            digits
                .parse::<f64>()
                .map_err(|_| format!("match_percentage '{s}' is not a number"))?
        }
    };

    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(format!("match_percentage {value} is outside 0-100"));
    }
    Ok(value.round() as u8)
}

/// Drops courses that cannot satisfy the url-or-topics invariant.
fn normalize_course(raw: RawCourse) -> Option<CourseRecommendation> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let url = raw
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let topics = (!raw.topics_to_cover.is_empty()).then_some(raw.topics_to_cover);

    if url.is_none() && topics.is_none() {
        debug!("Dropping course '{name}': neither url nor topics_to_cover");
        return None;
    }

    Some(CourseRecommendation {
        name,
        url,
        topics_to_cover: topics,
    })
}

fn parse_unchecked(reply: &str) -> Result<UncheckedFeedback, AnalysisError> {
    let span = extract_json_span(reply)
        .ok_or_else(|| malformed("no JSON object found in reply".to_string(), reply))?;

    let raw: RawFeedback = serde_json::from_str(span)
        .map_err(|e| malformed(format!("reply JSON does not match schema: {e}"), reply))?;

    let match_percentage = raw
        .match_percentage
        .map(normalize_percentage)
        .transpose()
        .map_err(|reason| malformed(reason, reply))?;

    let courses = raw
        .course_recommendations
        .unwrap_or_default()
        .into_iter()
        .filter_map(normalize_course)
        .collect();

    Ok(UncheckedFeedback {
        match_percentage,
        similarities: raw.similarities,
        missing: raw.missing,
        courses,
    })
}

/// Keeps courses whose link is live, or that carry topics instead of a link.
///
/// A course with a dead link is dropped outright, even if it also lists topics.
/// Links are checked concurrently; the result keeps the reply's order.
async fn retain_live_courses(
    courses: Vec<CourseRecommendation>,
    validator: &dyn UrlValidator,
) -> Vec<CourseRecommendation> {
    stream::iter(courses)
        .map(|course| async move {
            let keep = match course.url.as_deref() {
                Some(url) => validator.is_reachable(url).await,
                None => true,
            };
            if !keep {
                debug!("Dropping course '{}': link is not live", course.name);
            }
            keep.then_some(course)
        })
        .buffered(LINK_CHECK_CONCURRENCY)
        .filter_map(|course| async move { course })
        .collect()
        .await
}

/// Parses an LLM reply and validates its course links.
pub async fn parse_feedback(
    reply: &str,
    validator: &dyn UrlValidator,
) -> Result<FeedbackRecord, AnalysisError> {
    let unchecked = parse_unchecked(reply)?;
    let course_recommendations = retain_live_courses(unchecked.courses, validator).await;

    Ok(FeedbackRecord {
        match_percentage: unchecked.match_percentage,
        similarities: unchecked.similarities,
        missing: unchecked.missing,
        course_recommendations,
    })
}
