//! REST endpoints for templates, logged sessions and progression suggestions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::{AppState, database_response, error_response};

use super::model::{SessionExercise, WorkoutSession, WorkoutTemplate};
use super::progression::ProgressionEngine;

/// Session as the client logs it. `id` and `completedAt` are filled in when
/// absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSessionRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<SessionExercise>,
}

/// Load a template and check it belongs to `user_id`.
async fn owned_template(
    state: &AppState,
    user_id: &str,
    template_id: &str,
) -> Result<WorkoutTemplate, Response> {
    match state.db.get_template(template_id).await {
        Ok(Some(template)) if template.user_id == user_id => Ok(template),
        Ok(_) => Err(error_response(StatusCode::NOT_FOUND, "Template not found")),
        Err(e) => Err(database_response(e)),
    }
}

async fn list_templates(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match state.db.list_templates_for_user(&user_id).await {
        Ok(templates) => Json(templates).into_response(),
        Err(e) => database_response(e),
    }
}

async fn get_template(
    State(state): State<AppState>,
    Path((user_id, template_id)): Path<(String, String)>,
) -> Response {
    match owned_template(&state, &user_id, &template_id).await {
        Ok(template) => Json(template).into_response(),
        Err(resp) => resp,
    }
}

/// POST /api/users/{user_id}/sessions
async fn log_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<LogSessionRequest>,
) -> Response {
    if let Some(ref template_id) = body.template_id {
        if let Err(resp) = owned_template(&state, &user_id, template_id).await {
            return resp;
        }
    }

    let session = WorkoutSession {
        id: body.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        user_id,
        template_id: body.template_id,
        completed_at: body.completed_at.unwrap_or_else(Utc::now),
        exercises: body.exercises,
    };

    if let Err(e) = state.db.save_session(&session).await {
        return database_response(e);
    }

    info!(
        user_id = %session.user_id,
        session_id = %session.id,
        exercises = session.exercises.len(),
        "Session logged"
    );
    (StatusCode::CREATED, Json(session)).into_response()
}

/// GET /api/users/{user_id}/templates/{template_id}/suggestions
///
/// Exercises with nothing to suggest are simply absent from the map.
async fn get_suggestions(
    State(state): State<AppState>,
    Path((user_id, template_id)): Path<(String, String)>,
) -> Response {
    let template = match owned_template(&state, &user_id, &template_id).await {
        Ok(template) => template,
        Err(resp) => return resp,
    };

    let engine = ProgressionEngine::new(state.db.clone(), state.progression.clone());
    Json(engine.suggest(&user_id, &template).await).into_response()
}

/// Build the workout REST routes.
pub fn workout_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users/{user_id}/templates", get(list_templates))
        .route(
            "/api/users/{user_id}/templates/{template_id}",
            get(get_template),
        )
        .route(
            "/api/users/{user_id}/templates/{template_id}/suggestions",
            get(get_suggestions),
        )
        .route("/api/users/{user_id}/sessions", post(log_session))
        .with_state(state)
}
