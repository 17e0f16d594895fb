//! Progressive-overload suggestions.
//!
//! Looks at the most recent session logged against a template and, per
//! exercise, decides whether to add weight, add reps, or hold steady:
//!
//! - every set met the minimum, the last set reached the top of the range,
//!   and RPE was below the ceiling → add weight
//! - every set met the minimum otherwise → hold weight, chase reps
//! - a set fell short, or the weight can't be read → hold everything

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ProgressionConfig;
use crate::error::ProgressionError;
use crate::store::Database;

use super::model::{
    ExerciseSpec, SessionExercise, Suggestion, SuggestionMap, WorkoutSession, WorkoutTemplate,
};
use super::parse::{format_weight, parse_logged_reps, parse_rep_range, parse_weight};

/// Which rule fired for an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AdvanceWeight,
    AdvanceReps,
    Hold,
}

/// Computes next-session targets from stored history.
pub struct ProgressionEngine {
    db: Arc<dyn Database>,
    config: ProgressionConfig,
}

impl ProgressionEngine {
    pub fn new(db: Arc<dyn Database>, config: ProgressionConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Suggestions for `template` based on the user's latest matching session.
    ///
    /// Best effort: returns an empty map if history can't be read, and skips
    /// exercises that fail individually.
    pub async fn suggest(&self, user_id: &str, template: &WorkoutTemplate) -> SuggestionMap {
        let sessions = match self.db.get_sessions_for_user(user_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(user_id, template_id = %template.id, error = %e, "Failed to load session history");
                return SuggestionMap::new();
            }
        };
        suggest_from_history(template, &sessions, &self.config)
    }
}

/// Newest session logged against `template_id`.
pub fn latest_matching_session<'a>(
    template_id: &str,
    sessions: &'a [WorkoutSession],
) -> Option<&'a WorkoutSession> {
    sessions
        .iter()
        .filter(|s| s.template_id.as_deref() == Some(template_id))
        .max_by_key(|s| s.completed_at)
}

/// Pure core of [`ProgressionEngine::suggest`] for callers that already hold
/// the history.
pub fn suggest_from_history(
    template: &WorkoutTemplate,
    sessions: &[WorkoutSession],
    config: &ProgressionConfig,
) -> SuggestionMap {
    let mut suggestions = SuggestionMap::new();

    let Some(last) = latest_matching_session(&template.id, sessions) else {
        debug!(template_id = %template.id, "No prior session for template");
        return suggestions;
    };

    for spec in &template.exercises {
        let Some(logged) = last.exercises.iter().find(|e| e.id == spec.id) else {
            continue;
        };
        match suggest_for_exercise(spec, logged, config) {
            Ok(Some(suggestion)) => {
                suggestions.insert(spec.id.clone(), suggestion);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(exercise_id = %spec.id, exercise = %spec.name, error = %e, "Skipping progression for exercise");
            }
        }
    }

    debug!(
        template_id = %template.id,
        session_id = %last.id,
        count = suggestions.len(),
        "Computed progression suggestions"
    );
    suggestions
}

/// Suggestion for one exercise, or `None` when it can't be evaluated
/// (no sets logged, unparseable rep target).
pub fn suggest_for_exercise(
    spec: &ExerciseSpec,
    logged: &SessionExercise,
    config: &ProgressionConfig,
) -> Result<Option<Suggestion>, ProgressionError> {
    let Some(last_set) = logged.performed_sets.last() else {
        return Ok(None);
    };
    let Some((min, max)) = parse_rep_range(spec.reps.as_deref()).bounds() else {
        return Ok(None);
    };

    let mut met_minimum = true;
    for set in &logged.performed_sets {
        check_rpe(&set.id, set.rpe)?;
        match parse_logged_reps(set.reps.as_deref()) {
            Some(reps) if reps >= min => {}
            _ => {
                met_minimum = false;
                break;
            }
        }
    }
    check_rpe(&last_set.id, last_set.rpe)?;

    let last_reps = parse_logged_reps(last_set.reps.as_deref());
    let last_weight = parse_weight(last_set.weight.as_deref());
    let last_rpe = last_set.rpe;

    let decision = decide(met_minimum, last_reps, last_weight, last_rpe, max, config);
    let target = spec.reps.clone();
    let target_label = target.as_deref().unwrap_or_default();
    let template_weight = spec.weight.clone();

    let suggestion = match (decision, last_weight) {
        (Decision::AdvanceWeight, Some(weight)) => {
            let next = format_weight(weight + config.weight_increment).or(template_weight);
            let rpe_part = last_rpe.map(|r| format!(" at RPE {r}")).unwrap_or_default();
            Suggestion {
                note: format!(
                    "Hit {} reps (target {target_label}){rpe_part}. Increase weight to {}.",
                    last_reps.unwrap_or(max),
                    next.as_deref().unwrap_or("the next step"),
                ),
                weight: next,
                reps: target,
            }
        }
        (Decision::AdvanceReps, Some(weight)) => {
            let held = format_weight(weight).or(template_weight);
            let goal = if min == max {
                max.saturating_add(config.rep_increment)
            } else {
                max
            };
            let lead = match last_rpe {
                Some(r) if last_reps.is_some_and(|reps| reps >= max) => {
                    format!("Reached {max} reps but RPE {r} was high.")
                }
                _ => format!("Met the minimum of {min} reps."),
            };
            Suggestion {
                note: format!(
                    "{lead} Stay at {} and aim for {goal} reps.",
                    held.as_deref().unwrap_or("the same weight"),
                ),
                weight: held,
                reps: Some(goal.to_string()),
            }
        }
        _ => {
            let held = last_weight.and_then(format_weight).or(template_weight);
            let note = if last_weight.is_none() {
                format!(
                    "Couldn't read the logged weight. Keep the same load and hit at least {min} reps on every set."
                )
            } else {
                format!(
                    "Hit at least {min} reps on every set before increasing weight or reps."
                )
            };
            Suggestion {
                weight: held,
                reps: target,
                note,
            }
        }
    };

    Ok(Some(suggestion))
}

fn check_rpe(set_id: &str, rpe: Option<f64>) -> Result<(), ProgressionError> {
    match rpe {
        Some(value) if !(0.0..=10.0).contains(&value) => Err(ProgressionError::InvalidRpe {
            set_id: set_id.to_string(),
            value,
        }),
        _ => Ok(()),
    }
}

fn decide(
    met_minimum: bool,
    last_reps: Option<u32>,
    last_weight: Option<f64>,
    last_rpe: Option<f64>,
    max: u32,
    config: &ProgressionConfig,
) -> Decision {
    if !met_minimum || last_weight.is_none() {
        return Decision::Hold;
    }
    let reached_max = last_reps.is_some_and(|reps| reps >= max);
    let effort_ok = last_rpe.is_none_or(|rpe| rpe < config.rpe_ceiling);
    if reached_max && effort_ok {
        Decision::AdvanceWeight
    } else {
        Decision::AdvanceReps
    }
}
