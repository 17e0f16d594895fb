//! Workout templates, logged sessions, and progression suggestions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One exercise in a template. `sets`, `reps` and `weight` are display
/// strings and may hold ranges like "8-12".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Option<String>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub rest_period_seconds: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ExerciseSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sets: None,
            reps: None,
            weight: None,
            rest_period_seconds: None,
            note: None,
        }
    }

    pub fn with_reps(mut self, reps: impl Into<String>) -> Self {
        self.reps = Some(reps.into());
        self
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn with_sets(mut self, sets: impl Into<String>) -> Self {
        self.sets = Some(sets.into());
        self
    }
}

/// One training day as produced by plan synthesis, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplateDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "isAIPlan")]
    pub is_ai_plan: bool,
    pub exercises: Vec<ExerciseSpec>,
}

/// A stored template. `version` guards concurrent updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "isAIPlan")]
    pub is_ai_plan: bool,
    pub exercises: Vec<ExerciseSpec>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutTemplate {
    /// A new, unsaved template (version 0) owned by `user_id`.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            description: String::new(),
            is_ai_plan: false,
            exercises: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_draft(user_id: impl Into<String>, draft: WorkoutTemplateDraft) -> Self {
        let mut template = Self::new(user_id, draft.name);
        template.description = draft.description;
        template.is_ai_plan = draft.is_ai_plan;
        template.exercises = draft.exercises;
        template
    }

    pub fn with_exercise(mut self, exercise: ExerciseSpec) -> Self {
        self.exercises.push(exercise);
        self
    }
}

/// A set as it was logged. Strings are whatever the user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedSet {
    pub id: String,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    /// Rate of perceived exertion, 0-10.
    #[serde(default)]
    pub rpe: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PerformedSet {
    pub fn new(reps: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reps: Some(reps.into()),
            weight: Some(weight.into()),
            rpe: None,
            notes: None,
        }
    }

    pub fn with_rpe(mut self, rpe: f64) -> Self {
        self.rpe = Some(rpe);
        self
    }
}

/// Exercise inside a logged session. `id` matches the template's
/// `ExerciseSpec::id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub performed_sets: Vec<PerformedSet>,
}

/// A completed workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<SessionExercise>,
}

/// Next-session target for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub weight: Option<String>,
    pub reps: Option<String>,
    pub note: String,
}

/// Suggestions keyed by exercise id.
pub type SuggestionMap = HashMap<String, Suggestion>;
