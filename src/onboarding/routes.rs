//! REST endpoints for the onboarding chat and the saved profile.
//!
//! The chat is stateless on the server: the client sends the turns it holds
//! and gets the updated turns back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::api::{AppState, database_response, error_response, llm_status};
use crate::error::OnboardingError;

use super::manager::{ConversationOrchestrator, Exchange};
use super::model::{ChatTurn, UserProfile};
use super::prompts::FALLBACK_REPLY;
use super::state::{Conversation, ConversationState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    pub history: Vec<ChatTurn>,
}

/// POST /api/users/{user_id}/onboarding/chat
///
/// Runs one exchange. On finalize the profile is saved for the user.
async fn chat(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> Response {
    let mut orchestrator = ConversationOrchestrator::resume(
        state.llm.clone(),
        state.onboarding.clone(),
        Conversation::from_turns(body.history),
    );

    let exchange = match orchestrator.send(&body.message).await {
        Ok(exchange) => exchange,
        Err(OnboardingError::Llm(e)) => {
            return (
                llm_status(&e),
                Json(json!({
                    "error": e.to_string(),
                    "category": e.category(),
                    "fallbackReply": FALLBACK_REPLY,
                    "history": orchestrator.conversation().turns(),
                })),
            )
                .into_response();
        }
        Err(e @ OnboardingError::AlreadyFinalized) => {
            return error_response(StatusCode::CONFLICT, e.to_string());
        }
    };

    let conversation = orchestrator.into_conversation();
    let response = match exchange {
        Exchange::Continue { reply } => ChatResponse {
            state: conversation.state(),
            reply: Some(reply),
            profile: None,
            history: conversation.turns().to_vec(),
        },
        Exchange::Finalized { profile } => {
            if let Err(e) = state.db.save_profile(&user_id, &profile).await {
                warn!(user_id = %user_id, error = %e, "Failed to save onboarding profile");
                return database_response(e);
            }
            info!(user_id = %user_id, "Onboarding profile saved");
            ChatResponse {
                state: conversation.state(),
                reply: None,
                profile: Some(profile),
                history: conversation.turns().to_vec(),
            }
        }
    };

    Json(response).into_response()
}

/// GET /api/users/{user_id}/profile
///
/// Returns the saved profile, or 404 if onboarding hasn't finished.
async fn get_profile(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match state.db.get_profile(&user_id).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No profile exists yet"),
        Err(e) => database_response(e),
    }
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/users/{user_id}/onboarding/chat", post(chat))
        .route("/api/users/{user_id}/profile", get(get_profile))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
    use crate::store::{Database, LibSqlBackend};

    struct OneReply(Result<&'static str, ()>);

    #[async_trait]
    impl LlmProvider for OneReply {
        fn model_name(&self) -> &str {
            "one-reply"
        }

        fn cost_per_token(&self) -> (Decimal, Decimal) {
            (Decimal::ZERO, Decimal::ZERO)
        }

        async fn complete(&self, _: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            match self.0 {
                Ok(content) => Ok(CompletionResponse {
                    content: content.to_string(),
                    input_tokens: 0,
                    output_tokens: 0,
                    finish_reason: FinishReason::Stop,
                    response_id: None,
                }),
                Err(()) => Err(LlmError::AuthFailed {
                    provider: "one-reply".into(),
                }),
            }
        }
    }

    async fn app(reply: Result<&'static str, ()>) -> (Router, Arc<dyn Database>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let state = AppState::new(db.clone(), Arc::new(OneReply(reply)));
        (onboarding_routes(state), db)
    }

    async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::post("/api/users/u1/onboarding/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn conversational_reply_extends_history() {
        let (app, _) = app(Ok("How old are you?")).await;
        let (status, body) = post_chat(app, json!({"history": [], "message": "I want to get strong"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "collecting");
        assert_eq!(body["reply"], "How old are you?");
        assert_eq!(body["history"].as_array().unwrap().len(), 2);
        assert!(body.get("profile").is_none());
    }

    #[tokio::test]
    async fn structured_reply_finalizes_and_saves_profile() {
        let (app, db) = app(Ok(
            "```json\n{\"primaryGoal\": \"strength\", \"age\": \"34\"}\n```",
        ))
        .await;
        let (status, body) = post_chat(app, json!({"message": "34, strength"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "finalized");
        assert_eq!(body["profile"]["age"], 34);

        let saved = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(saved.primary_goal.as_deref(), Some("strength"));
    }

    #[tokio::test]
    async fn provider_failure_returns_category_and_fallback() {
        let (app, db) = app(Err(())).await;
        let (status, body) = post_chat(app, json!({"message": "hello"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["category"], "auth_failed");
        assert_eq!(body["fallbackReply"], FALLBACK_REPLY);
        assert!(body["history"].as_array().unwrap().is_empty());
        assert!(db.get_profile("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_profile_is_404() {
        let (app, _) = app(Ok("unused")).await;
        let resp = app
            .oneshot(Request::get("/api/users/u1/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
