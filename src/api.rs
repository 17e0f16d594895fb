//! HTTP surface: shared state, the merged router, and error bodies.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::{OnboardingConfig, PlanConfig, ProgressionConfig};
use crate::error::{DatabaseError, LlmError};
use crate::llm::LlmProvider;
use crate::onboarding::routes::onboarding_routes;
use crate::plans::routes::plan_routes;
use crate::store::Database;
use crate::workouts::routes::workout_routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub llm: Arc<dyn LlmProvider>,
    pub onboarding: OnboardingConfig,
    pub plans: PlanConfig,
    pub progression: ProgressionConfig,
}

impl AppState {
    /// State with default tuning for every component.
    pub fn new(db: Arc<dyn Database>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            db,
            llm,
            onboarding: OnboardingConfig::default(),
            plans: PlanConfig::default(),
            progression: ProgressionConfig::default(),
        }
    }

    pub fn with_onboarding(mut self, onboarding: OnboardingConfig) -> Self {
        self.onboarding = onboarding;
        self
    }

    pub fn with_plans(mut self, plans: PlanConfig) -> Self {
        self.plans = plans;
        self
    }

    pub fn with_progression(mut self, progression: ProgressionConfig) -> Self {
        self.progression = progression;
        self
    }
}

/// Build the full router: health check plus every feature's routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(onboarding_routes(state.clone()))
        .merge(plan_routes(state.clone()))
        .merge(workout_routes(state))
        .layer(ServiceBuilder::new().layer(cors))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "adaptive-coach"
    }))
}

// ── Error bodies ────────────────────────────────────────────────────────

/// `{"error": message}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// HTTP status for a provider failure. The upstream is at fault unless it
/// told us to slow down.
pub(crate) fn llm_status(err: &LlmError) -> StatusCode {
    match err {
        LlmError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Storage failures are 500s except for the two a client can act on.
pub(crate) fn database_response(err: DatabaseError) -> Response {
    match err {
        DatabaseError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, err.to_string()),
        DatabaseError::Conflict { .. } => error_response(StatusCode::CONFLICT, err.to_string()),
        other => {
            error!(error = %other, "Database error");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
        }
    }
}
