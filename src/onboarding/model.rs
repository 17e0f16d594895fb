//! User profile and conversation data models.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));

/// Who said a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One message in the onboarding conversation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

/// A training day. Serialized as the lowercase day name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Allow-list check: exactly one of the seven day names, case and
    /// surrounding whitespace ignored. Ranges and phrases are rejected.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|day| day.as_str() == token)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Profile collected during onboarding.
///
/// Every field is optional: absent means "unknown", never zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injuries_or_limitations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_split: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_exercises: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disliked_exercises: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_days: Option<Vec<Weekday>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_per_session_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_level: Option<String>,
}

impl UserProfile {
    /// Build a profile from model-extracted JSON.
    ///
    /// Lenient on types (numbers may arrive as strings, lists as
    /// comma-separated text) and strict on `availableDays`, which only keeps
    /// exact day names.
    pub fn from_extracted(data: &Value) -> Self {
        Self {
            age: number_field(data, "age").and_then(to_u32),
            height_cm: number_field(data, "heightCm"),
            weight_kg: number_field(data, "weightKg"),
            gender: string_field(data, "gender"),
            experience_level: string_field(data, "experienceLevel"),
            primary_goal: string_field(data, "primaryGoal"),
            secondary_goal: string_field(data, "secondaryGoal"),
            injuries_or_limitations: string_field(data, "injuriesOrLimitations"),
            performance_notes: string_field(data, "performanceNotes"),
            preferred_split: string_field(data, "preferredSplit"),
            liked_exercises: list_field(data, "likedExercises"),
            disliked_exercises: list_field(data, "dislikedExercises"),
            available_days: list_field(data, "availableDays").map(|days| allowed_days(&days)),
            time_per_session_minutes: number_field(data, "timePerSessionMinutes")
                .and_then(to_u32),
            onboarding_level: string_field(data, "onboardingLevel"),
        }
    }

    /// Whether nothing at all is known.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_field(data: &Value, key: &str) -> Option<f64> {
    let n = match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => FIRST_NUMBER.find(s)?.as_str().parse().ok(),
        _ => None,
    };
    n.filter(|n: &f64| n.is_finite() && *n >= 0.0)
}

fn to_u32(n: f64) -> Option<u32> {
    let rounded = n.round();
    (rounded <= u32::MAX as f64).then_some(rounded as u32)
}

fn list_field(data: &Value, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = match data.get(key)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => return None,
    };
    Some(items)
}

fn allowed_days(tokens: &[String]) -> Vec<Weekday> {
    let mut days = Vec::new();
    for token in tokens {
        match Weekday::parse(token) {
            Some(day) if !days.contains(&day) => days.push(day),
            Some(_) => {}
            None => {
                tracing::warn!(token = %token, "Dropping non-canonical available day");
            }
        }
    }
    days
}
