//! LLM integration for Adaptive Coach.
//!
//! Supports:
//! - **Anthropic**: direct Messages API access over `reqwest`
//!
//! Everything above this module talks to the `LlmProvider` trait only, so
//! tests and alternative backends plug in without touching callers.

pub mod anthropic;
pub mod credentials;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use credentials::{CredentialCache, CredentialSource, EnvCredentialSource, StaticCredentialSource};
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    /// Environment variable the API key is read from on first use.
    pub api_key_env: String,
    /// Override for the provider host (proxies, local stubs).
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Load from `COACH_MODEL`, `COACH_LLM_BASE_URL`, `COACH_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            backend: LlmBackend::Anthropic,
            model: std::env::var("COACH_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: std::env::var("COACH_LLM_BASE_URL").ok(),
            timeout: crate::config::llm_request_timeout(),
        }
    }
}

/// Create an LLM provider from configuration.
///
/// The API key is not read here; the credential cache fetches it lazily on
/// the first completion.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => {
            let source = Arc::new(EnvCredentialSource::new("anthropic", &config.api_key_env));
            let credentials = Arc::new(CredentialCache::new(source));
            let mut provider = AnthropicProvider::new(&config.model, credentials, config.timeout)?;
            if let Some(ref base_url) = config.base_url {
                provider = provider.with_base_url(base_url);
            }
            tracing::info!("Using Anthropic (model: {})", config.model);
            Ok(Arc::new(provider))
        }
    }
}
