//! Structured data extraction from free-form model replies.
//!
//! Two stages: find a candidate JSON span (a fenced block, optionally tagged
//! `json`, or a bare `{...}` object), then check that it parses and has the
//! expected shape. Anything that fails either stage is treated as ordinary
//! conversation, never as an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Fenced block (group 1) or bare top-level object (group 2).
static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```|(\{.*\})").expect("valid extraction regex")
});

/// Keys that mark an object as a user profile.
pub const PROFILE_KEYS: [&str; 3] = ["primaryGoal", "age", "experienceLevel"];

/// What a terminal reply should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    /// A plain object with at least one of [`PROFILE_KEYS`].
    Profile,
    /// A non-empty array whose first element has `name` and `exercises`.
    Plan,
}

impl ExpectedShape {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Profile => value
                .as_object()
                .is_some_and(|obj| PROFILE_KEYS.iter().any(|k| obj.contains_key(*k))),
            Self::Plan => value
                .as_array()
                .and_then(|items| items.first())
                .and_then(Value::as_object)
                .is_some_and(|first| first.contains_key("name") && first.contains_key("exercises")),
        }
    }
}

/// Outcome of scanning a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Valid structured data of the expected shape.
    Structured(Value),
    /// No usable data; the original text, verbatim, for display.
    Conversational(String),
}

impl Extraction {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Candidate JSON span in `text`, preferring a fenced block.
pub fn find_candidate(text: &str) -> Option<&str> {
    let caps = CANDIDATE.captures(text)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Scan `text` for structured data of the `expected` shape.
pub fn extract(text: &str, expected: ExpectedShape) -> Extraction {
    let Some(candidate) = find_candidate(text) else {
        return Extraction::Conversational(text.to_string());
    };

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Candidate JSON did not parse; treating reply as conversation");
            return Extraction::Conversational(text.to_string());
        }
    };

    if expected.accepts(&value) {
        Extraction::Structured(value)
    } else {
        tracing::debug!(?expected, "JSON found but shape check failed; treating reply as conversation");
        Extraction::Conversational(text.to_string())
    }
}
