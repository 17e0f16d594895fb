//! REST endpoint that turns a saved profile into stored workout templates.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::{AppState, database_response, error_response, llm_status};
use crate::error::PlanError;
use crate::workouts::WorkoutTemplate;

use super::synthesizer::PlanSynthesizer;

/// POST /api/users/{user_id}/plans
///
/// Synthesizes a plan from the user's profile and stores every day as a
/// template. A bad plan never touches the stored profile.
async fn create_plan(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let profile = match state.db.get_profile(&user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Finish onboarding before requesting a plan");
        }
        Err(e) => return database_response(e),
    };

    let synthesizer = PlanSynthesizer::new(state.llm.clone(), state.plans.clone());
    let drafts = match synthesizer.synthesize(&profile).await {
        Ok(drafts) => drafts,
        Err(PlanError::InvalidFormat(reason)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": reason, "category": "plan_format"})),
            )
                .into_response();
        }
        Err(PlanError::Llm(e)) => {
            warn!(user_id = %user_id, category = e.category(), "Plan request failed");
            return (
                llm_status(&e),
                Json(json!({"error": e.to_string(), "category": e.category()})),
            )
                .into_response();
        }
    };

    let mut saved: Vec<WorkoutTemplate> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let template = WorkoutTemplate::from_draft(user_id.as_str(), draft);
        match state.db.save_template(&template).await {
            Ok(stored) => saved.push(stored),
            Err(e) => {
                discard_partial_plan(&state, &user_id, &saved).await;
                return database_response(e);
            }
        }
    }

    info!(user_id = %user_id, templates = saved.len(), "Plan stored");
    (StatusCode::CREATED, Json(saved)).into_response()
}

/// Remove the days of a plan that could not be stored in full.
async fn discard_partial_plan(state: &AppState, user_id: &str, saved: &[WorkoutTemplate]) {
    for template in saved {
        if let Err(e) = state.db.delete_template(&template.id).await {
            error!(user_id, template_id = %template.id, error = %e, "Failed to remove partial plan day");
        }
    }
    warn!(user_id, discarded = saved.len(), "Plan save failed; partial plan removed");
}

/// Build the plan REST routes.
pub fn plan_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users/{user_id}/plans", post(create_plan))
        .with_state(state)
}
