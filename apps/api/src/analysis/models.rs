use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A course the candidate could take to close a gap.
///
/// Invariant: at least one of `url` or `topics_to_cover` is present. Only the
/// feedback parser builds these from LLM output, and it enforces the invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_to_cover: Option<Vec<String>>,
}

/// Structured résumé-vs-job-description comparison.
///
/// Produced once per pair by the feedback parser and never mutated afterwards;
/// output shaping goes through `projection::project`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// 0–100. `None` when the model omitted it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<u8>,
    pub similarities: Vec<String>,
    pub missing: Vec<String>,
    pub course_recommendations: Vec<CourseRecommendation>,
}

/// A caller-selectable output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Percentage,
    Similarities,
    Missing,
    Courses,
}

impl FieldKey {
    /// Every real key, in canonical column order.
    pub const ALL: [FieldKey; 4] = [
        FieldKey::Percentage,
        FieldKey::Similarities,
        FieldKey::Missing,
        FieldKey::Courses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Percentage => "percentage",
            FieldKey::Similarities => "similarities",
            FieldKey::Missing => "missing",
            FieldKey::Courses => "courses",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldKey(pub String);

impl fmt::Display for UnknownFieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown field '{}' (expected one of: all, percentage, similarities, missing, courses)",
            self.0
        )
    }
}

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(FieldKey::Percentage),
            "similarities" => Ok(FieldKey::Similarities),
            "missing" => Ok(FieldKey::Missing),
            "courses" => Ok(FieldKey::Courses),
            _ => Err(UnknownFieldKey(s.trim().to_string())),
        }
    }
}

/// The caller's field selection, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    /// Non-empty, deduplicated, in caller order.
    Fields(Vec<FieldKey>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    Empty,
    Unknown(UnknownFieldKey),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::Empty => f.write_str("no output fields selected"),
            SelectionError::Unknown(e) => e.fmt(f),
        }
    }
}

impl FieldSelection {
    /// Parses raw selections. Each item may itself be a comma-separated list.
    ///
    /// `all` anywhere wins over named keys, but every key is still checked so a
    /// typo is never silently ignored.
    pub fn parse<I, S>(raw: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<FieldKey> = Vec::new();
        let mut wildcard = false;

        for item in raw {
            for token in item.as_ref().split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                if token.eq_ignore_ascii_case("all") {
                    wildcard = true;
                    continue;
                }
                let key = token.parse::<FieldKey>().map_err(SelectionError::Unknown)?;
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        if wildcard {
            Ok(FieldSelection::All)
        } else if keys.is_empty() {
            Err(SelectionError::Empty)
        } else {
            Ok(FieldSelection::Fields(keys))
        }
    }

    /// Concrete keys in output order.
    pub fn keys(&self) -> Vec<FieldKey> {
        match self {
            FieldSelection::All => FieldKey::ALL.to_vec(),
            FieldSelection::Fields(keys) => keys.clone(),
        }
    }
}
