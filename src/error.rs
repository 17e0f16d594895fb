//! Error types for Adaptive Coach.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Version conflict on {entity} {id}: expected version {expected}")]
    Conflict {
        entity: String,
        id: String,
        expected: i64,
    },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Language model provider errors.
///
/// Each HTTP status family maps to its own variant so callers can tell an
/// auth problem from a misconfigured model or a plain outage.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rejected the request: {reason}")]
    BadRequest { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Model {model} not available on provider {provider}")]
    ModelNotAvailable { provider: String, model: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("No credential available for provider {provider}: {reason}")]
    MissingCredential { provider: String, reason: String },
}

impl LlmError {
    /// Stable snake_case category name, used in API error bodies and logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::RequestFailed { .. } => "service_error",
            Self::BadRequest { .. } => "bad_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::ModelNotAvailable { .. } => "model_not_available",
            Self::AuthFailed { .. } | Self::MissingCredential { .. } => "auth_failed",
        }
    }
}

/// Onboarding conversation errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Conversation already finalized")]
    AlreadyFinalized,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Plan synthesis errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The model answered, but not with a usable plan.
    #[error("Invalid plan format: {0}")]
    InvalidFormat(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Per-exercise progression errors. Never fatal to a whole suggestion run.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("RPE {value} on set {set_id} is outside 0-10")]
    InvalidRpe { set_id: String, value: f64 },
}
