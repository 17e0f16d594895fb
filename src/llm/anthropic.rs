//! Anthropic Messages API transport over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

use super::credentials::CredentialCache;
use super::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Direct client for `POST /v1/messages`.
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    credentials: Arc<CredentialCache>,
}

impl AnthropicProvider {
    pub fn new(
        model: impl Into<String>,
        credentials: Arc<CredentialCache>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            credentials,
        })
    }

    /// Point the client at a different host (proxies, test stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// System messages go to the top-level `system` field; the rest keep
    /// their order as user/assistant turns.
    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        let messages = request
            .conversation()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system_prompt(),
            messages,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Map a non-success HTTP status to an error category.
pub(crate) fn map_status(
    status: StatusCode,
    body: &str,
    model: &str,
    retry_after: Option<Duration>,
) -> LlmError {
    let provider = PROVIDER.to_string();
    match status.as_u16() {
        401 | 403 => LlmError::AuthFailed { provider },
        400 | 413 | 422 => LlmError::BadRequest {
            provider,
            reason: truncate(body, 500),
        },
        404 => LlmError::ModelNotAvailable {
            provider,
            model: model.to_string(),
        },
        429 => LlmError::RateLimited {
            provider,
            retry_after,
        },
        _ => LlmError::RequestFailed {
            provider,
            reason: format!("HTTP {status}: {}", truncate(body, 500)),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        let model = self.model.to_lowercase();
        if model.contains("opus") {
            (dec!(0.000015), dec!(0.000075))
        } else if model.contains("haiku") {
            (dec!(0.0000008), dec!(0.000004))
        } else {
            (dec!(0.000003), dec!(0.000015))
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.credentials.get().await?;

        let body = self.build_body(&request);

        let resp = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            let text = resp.text().await.unwrap_or_default();
            let err = map_status(status, &text, &self.model, retry_after);
            tracing::warn!(
                status = %status,
                category = err.category(),
                model = %self.model,
                "Anthropic request failed"
            );
            if matches!(err, LlmError::AuthFailed { .. }) {
                self.credentials.reset().await;
            }
            return Err(err);
        }

        let parsed: MessagesResponse =
            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let content = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let response = CompletionResponse {
            content,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
            finish_reason: FinishReason::from_stop_reason(parsed.stop_reason.as_deref()),
            response_id: parsed.id,
        };

        tracing::debug!(
            model = %self.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %response.cost(self.cost_per_token()),
            "Anthropic completion"
        );

        Ok(response)
    }
}
