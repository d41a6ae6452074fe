//! Parameter Projector: renders a `FeedbackRecord` down to the fields a caller
//! selected.
//!
//! Two rendering modes:
//! - `Json`: lists stay lists, courses stay nested objects, absent fields are omitted.
//! - `Table`: every cell is a display string, absent fields read `"N/A"`.
//!
//! Keys appear in selection order, which is also table column order.

use serde_json::{Map, Value};

use crate::analysis::models::{CourseRecommendation, FeedbackRecord, FieldKey, FieldSelection};

/// Field-key → display value, in selection order.
pub type ProjectedFeedback = Map<String, Value>;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Json,
    Table,
}

pub fn project(
    record: &FeedbackRecord,
    selection: &FieldSelection,
    mode: RenderMode,
) -> ProjectedFeedback {
    let mut out = Map::new();
    for key in selection.keys() {
        if let Some(value) = render_field(record, key, mode) {
            out.insert(key.as_str().to_string(), value);
        }
    }
    out
}

fn render_field(record: &FeedbackRecord, key: FieldKey, mode: RenderMode) -> Option<Value> {
    match (key, mode) {
        (FieldKey::Percentage, _) => match record.match_percentage {
            Some(p) => Some(Value::String(format!("{p}%"))),
            None if mode == RenderMode::Table => Some(not_available()),
            None => None,
        },
        (FieldKey::Similarities, RenderMode::Json) => Some(string_list(&record.similarities)),
        (FieldKey::Missing, RenderMode::Json) => Some(string_list(&record.missing)),
        (FieldKey::Courses, RenderMode::Json) => {
            serde_json::to_value(&record.course_recommendations).ok()
        }
        (FieldKey::Similarities, RenderMode::Table) => Some(joined_cell(&record.similarities)),
        (FieldKey::Missing, RenderMode::Table) => Some(joined_cell(&record.missing)),
        (FieldKey::Courses, RenderMode::Table) => {
            Some(courses_cell(&record.course_recommendations))
        }
    }
}

fn not_available() -> Value {
    Value::String(NOT_AVAILABLE.to_string())
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn joined_cell(items: &[String]) -> Value {
    if items.is_empty() {
        not_available()
    } else {
        Value::String(items.join(", "))
    }
}

/// `name (url)` or `name: topic, topic`, entries separated by `"; "`.
fn courses_cell(courses: &[CourseRecommendation]) -> Value {
    if courses.is_empty() {
        return not_available();
    }
    let rendered: Vec<String> = courses
        .iter()
        .map(|c| match (&c.url, &c.topics_to_cover) {
            (Some(url), _) => format!("{} ({url})", c.name),
            (None, Some(topics)) => format!("{}: {}", c.name, topics.join(", ")),
            (None, None) => c.name.clone(),
        })
        .collect();
    Value::String(rendered.join("; "))
}
