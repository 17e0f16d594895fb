//! Workout templates, session history, and progressive overload.

pub mod model;
pub mod parse;
pub mod progression;
pub mod routes;

pub use model::{
    ExerciseSpec, PerformedSet, SessionExercise, Suggestion, SuggestionMap, WorkoutSession,
    WorkoutTemplate, WorkoutTemplateDraft,
};
pub use parse::{RepRange, format_weight, parse_logged_reps, parse_rep_range, parse_weight};
pub use progression::{Decision, ProgressionEngine, suggest_from_history};
