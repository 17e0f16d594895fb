//! PlanSynthesizer: turns a finalized profile into workout templates.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PlanConfig;
use crate::error::PlanError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::onboarding::UserProfile;
use crate::onboarding::prompts::PLAN_SYSTEM_PROMPT;
use crate::workouts::{ExerciseSpec, WorkoutTemplateDraft};

/// Builds multi-day plans with one completion call per profile.
pub struct PlanSynthesizer {
    llm: Arc<dyn LlmProvider>,
    config: PlanConfig,
}

impl PlanSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: PlanConfig) -> Self {
        Self { llm, config }
    }

    /// Ask the model for a plan and validate it.
    ///
    /// Provider failures come back as `PlanError::Llm`; anything wrong with
    /// the reply itself is `PlanError::InvalidFormat`.
    pub async fn synthesize(
        &self,
        profile: &UserProfile,
    ) -> Result<Vec<WorkoutTemplateDraft>, PlanError> {
        let profile_json = serde_json::to_string(profile)
            .map_err(|e| PlanError::InvalidFormat(format!("profile did not serialize: {e}")))?;

        let request = CompletionRequest::new(vec![
            ChatMessage::system(PLAN_SYSTEM_PROMPT),
            ChatMessage::user(profile_json),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature);

        let response = self.llm.complete(request).await?;

        match parse_plan(&response.content) {
            Ok(drafts) => {
                info!(
                    days = drafts.len(),
                    exercises = drafts.iter().map(|d| d.exercises.len()).sum::<usize>(),
                    "Plan synthesized"
                );
                Ok(drafts)
            }
            Err(e) => {
                warn!(error = %e, chars = response.content.len(), "Rejected plan reply");
                Err(e)
            }
        }
    }
}

/// Exercise as the model writes it: ids are untrusted, numbers may be bare.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExercise {
    name: String,
    #[serde(default)]
    sets: Option<Value>,
    #[serde(default)]
    reps: Option<Value>,
    #[serde(default)]
    weight: Option<Value>,
    #[serde(default)]
    rest_period_seconds: Option<Value>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    name: String,
    #[serde(default)]
    description: Option<String>,
    exercises: Vec<RawExercise>,
}

/// Validate a plan reply. The reply must be a bare JSON array.
pub fn parse_plan(reply: &str) -> Result<Vec<WorkoutTemplateDraft>, PlanError> {
    let value: Value = serde_json::from_str(reply.trim())
        .map_err(|e| PlanError::InvalidFormat(format!("reply is not JSON: {e}")))?;

    let Some(items) = value.as_array() else {
        return Err(PlanError::InvalidFormat(format!(
            "expected a JSON array of workout days, got {}",
            json_kind(&value)
        )));
    };

    let Some(first) = items.first() else {
        return Err(PlanError::InvalidFormat("plan has no workout days".into()));
    };
    let first_name_ok = first
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    if !first_name_ok {
        return Err(PlanError::InvalidFormat(
            "first workout day has no name".into(),
        ));
    }
    let first_exercises_ok = first
        .get("exercises")
        .and_then(Value::as_array)
        .is_some_and(|e| !e.is_empty());
    if !first_exercises_ok {
        return Err(PlanError::InvalidFormat(
            "first workout day has no exercises".into(),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let day: RawDay = serde_json::from_value(item.clone()).map_err(|e| {
                PlanError::InvalidFormat(format!("workout day {} is malformed: {e}", i + 1))
            })?;
            Ok(into_draft(day))
        })
        .collect()
}

fn into_draft(day: RawDay) -> WorkoutTemplateDraft {
    WorkoutTemplateDraft {
        name: day.name.trim().to_string(),
        description: day.description.unwrap_or_default(),
        is_ai_plan: true,
        exercises: day
            .exercises
            .into_iter()
            .map(|e| ExerciseSpec {
                id: Uuid::new_v4().to_string(),
                name: e.name,
                sets: e.sets.as_ref().and_then(display_string),
                reps: e.reps.as_ref().and_then(display_string),
                weight: e.weight.as_ref().and_then(display_string),
                rest_period_seconds: e.rest_period_seconds.as_ref().and_then(seconds),
                note: e.note.filter(|n| !n.trim().is_empty()),
            })
            .collect(),
    }
}

fn display_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn seconds(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
