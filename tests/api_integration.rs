//! Integration tests for the coach REST API.
//!
//! Each test spins up the Axum router on a random port backed by an
//! in-memory database and drives it over real HTTP with reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use adaptive_coach::api::{AppState, router};
use adaptive_coach::error::LlmError;
use adaptive_coach::llm::{
    AnthropicProvider, CompletionRequest, CompletionResponse, CredentialCache, FinishReason,
    LlmProvider, StaticCredentialSource,
};
use adaptive_coach::onboarding::FALLBACK_REPLY;
use adaptive_coach::onboarding::prompts::PLAN_SYSTEM_PROMPT;
use adaptive_coach::store::{Database, LibSqlBackend};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

const PLAN_REPLY: &str = r#"[
    {"name": "Day 1 - Push", "description": "Chest focus", "isAIPlan": true, "exercises": [
        {"name": "Bench Press", "sets": "3", "reps": "8-10", "weight": "135 lbs", "restPeriodSeconds": 90},
        {"name": "Overhead Press", "sets": "3", "reps": "5", "weight": "95 lbs"}
    ]},
    {"name": "Day 2 - Legs", "exercises": [
        {"name": "Squat", "sets": "3", "reps": "5", "weight": "225 lbs"}
    ]}
]"#;

/// Stub model: asks a question until the user says "done", then returns a
/// profile. Answers plan requests with a fixed plan.
struct CoachStub;

#[async_trait]
impl LlmProvider for CoachStub {
    fn model_name(&self) -> &str {
        "stub"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let content = if request.system_prompt().as_deref() == Some(PLAN_SYSTEM_PROMPT) {
            PLAN_REPLY.to_string()
        } else if request
            .conversation()
            .last()
            .is_some_and(|m| m.content.contains("done"))
        {
            "Great, here's your profile:\n```json\n{\"primaryGoal\": \"strength\", \"age\": 30, \
             \"experienceLevel\": \"beginner\", \"availableDays\": [\"monday\", \"thursday\", \"weekends\"]}\n```"
                .to_string()
        } else {
            "What's your main goal?".to_string()
        };
        Ok(CompletionResponse {
            content,
            input_tokens: 10,
            output_tokens: 10,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start the coach on a random port with the given model, return its base URL.
async fn start_coach(llm: Arc<dyn LlmProvider>) -> (String, Arc<dyn Database>) {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let base = serve(router(AppState::new(db.clone(), llm))).await;
    (base, db)
}

/// Fake Anthropic host that answers every request with `status`.
async fn start_failing_upstream(status: StatusCode) -> String {
    let app = Router::new().route(
        "/v1/messages",
        post(move || async move { (status, r#"{"type":"error"}"#) }),
    );
    serve(app).await
}

#[tokio::test]
async fn health_check() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_coach(Arc::new(CoachStub)).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn onboarding_to_suggestions_end_to_end() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_coach(Arc::new(CoachStub)).await;
        let client = reqwest::Client::new();
        let chat_url = format!("{base}/api/users/u1/onboarding/chat");

        // Opening exchange with no history.
        let first: Value = client
            .post(&chat_url)
            .json(&json!({"history": [], "message": ""}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(first["state"], "collecting");
        assert_eq!(first["reply"], "What's your main goal?");

        // Finish onboarding.
        let resp = client
            .post(&chat_url)
            .json(&json!({"history": first["history"], "message": "strength, 30, beginner, done"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let done: Value = resp.json().await.unwrap();
        assert_eq!(done["state"], "finalized");
        assert_eq!(done["profile"]["availableDays"], json!(["monday", "thursday"]));

        let profile: Value = client
            .get(format!("{base}/api/users/u1/profile"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(profile["primaryGoal"], "strength");

        // Plan.
        let resp = client
            .post(format!("{base}/api/users/u1/plans"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
        let templates: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(templates.len(), 2);
        let push = &templates[0];
        let template_id = push["id"].as_str().unwrap().to_string();
        let bench_id = push["exercises"][0]["id"].as_str().unwrap().to_string();
        let ohp_id = push["exercises"][1]["id"].as_str().unwrap().to_string();

        // Log a session against the first day.
        let resp = client
            .post(format!("{base}/api/users/u1/sessions"))
            .json(&json!({
                "templateId": template_id,
                "exercises": [
                    {"id": bench_id, "name": "Bench Press", "performedSets": [
                        {"id": "b1", "reps": "10", "weight": "135 lbs", "rpe": 7.5},
                        {"id": "b2", "reps": "10", "weight": "135 lbs", "rpe": 8}
                    ]},
                    {"id": ohp_id, "name": "Overhead Press", "performedSets": [
                        {"id": "o1", "reps": "5", "weight": "95 lbs"},
                        {"id": "o2", "reps": "4", "weight": "95 lbs"}
                    ]}
                ]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let suggestions: Value = client
            .get(format!(
                "{base}/api/users/u1/templates/{template_id}/suggestions"
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(suggestions[&bench_id]["weight"], "140 lbs");
        assert_eq!(suggestions[&ohp_id]["weight"], "95 lbs");
        assert_eq!(suggestions[&ohp_id]["reps"], "5");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upstream_auth_failure_surfaces_category_and_fallback() {
    timeout(TEST_TIMEOUT, async {
        let upstream = start_failing_upstream(StatusCode::UNAUTHORIZED).await;
        let credentials = Arc::new(CredentialCache::new(Arc::new(StaticCredentialSource::new(
            SecretString::from("sk-test"),
        ))));
        let provider = AnthropicProvider::new("claude-test", credentials, Duration::from_secs(5))
            .unwrap()
            .with_base_url(upstream);
        let (base, db) = start_coach(Arc::new(provider)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/users/u1/onboarding/chat"))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["category"], "auth_failed");
        assert_eq!(body["fallbackReply"], FALLBACK_REPLY);
        assert!(db.get_profile("u1").await.unwrap().is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upstream_missing_model_is_distinct_from_auth() {
    timeout(TEST_TIMEOUT, async {
        let upstream = start_failing_upstream(StatusCode::NOT_FOUND).await;
        let credentials = Arc::new(CredentialCache::new(Arc::new(StaticCredentialSource::new(
            SecretString::from("sk-test"),
        ))));
        let provider = AnthropicProvider::new("claude-missing", credentials, Duration::from_secs(5))
            .unwrap()
            .with_base_url(upstream);
        let (base, _) = start_coach(Arc::new(provider)).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{base}/api/users/u1/onboarding/chat"))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["category"], "model_not_available");
    })
    .await
    .expect("test timed out");
}
