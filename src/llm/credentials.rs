//! Process-wide API credential cache.
//!
//! The credential is fetched lazily on first use, then served from memory.
//! Initialization is single-flight: concurrent first callers wait on the same
//! fetch. `reset()` is the only way to force a refetch.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::error::LlmError;

/// Somewhere a provider credential can be fetched from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short description for logs (never the secret itself).
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<SecretString, LlmError>;
}

/// Reads the credential from an environment variable at fetch time.
pub struct EnvCredentialSource {
    provider: String,
    var: String,
}

impl EnvCredentialSource {
    pub fn new(provider: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            var: var.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }

    async fn fetch(&self) -> Result<SecretString, LlmError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
            _ => Err(LlmError::MissingCredential {
                provider: self.provider.clone(),
                reason: format!("{} is not set", self.var),
            }),
        }
    }
}

/// A fixed credential, e.g. one already loaded into `LlmConfig`.
pub struct StaticCredentialSource {
    secret: SecretString,
}

impl StaticCredentialSource {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<SecretString, LlmError> {
        if self.secret.expose_secret().is_empty() {
            return Err(LlmError::MissingCredential {
                provider: "static".to_string(),
                reason: "empty credential".to_string(),
            });
        }
        Ok(self.secret.clone())
    }
}

/// Lazily-initialized, explicitly-resettable credential cache.
pub struct CredentialCache {
    source: Arc<dyn CredentialSource>,
    cached: Mutex<Option<SecretString>>,
}

impl CredentialCache {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached credential, fetching it on first use.
    pub async fn get(&self) -> Result<SecretString, LlmError> {
        let mut cached = self.cached.lock().await;
        if let Some(ref secret) = *cached {
            return Ok(secret.clone());
        }

        let secret = self.source.fetch().await?;
        tracing::debug!(source = %self.source.describe(), "Credential fetched and cached");
        *cached = Some(secret.clone());
        Ok(secret)
    }

    /// Drop the cached credential so the next `get()` refetches it.
    pub async fn reset(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            tracing::info!(source = %self.source.describe(), "Credential cache reset");
        }
    }

    /// Whether a credential is currently cached.
    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}
