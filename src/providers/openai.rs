//! OpenAI provider implementation using the `/v1/chat/completions` API.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::OpenAiConfig;

use super::{
    check_http_response, Choice, ChoiceMessage, CompletionRequest, CompletionResponse,
    LlmProvider, ProviderError, Role, UsageStats,
};

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// OpenAI chat completions API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAiMessage>,
    /// Always `false`; this layer never streams.
    pub stream: bool,
}

/// A message in OpenAI chat format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct OpenAiMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: String,
    /// Plain text content.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// OpenAI chat completions API provider.
#[derive(Clone)]
pub struct OpenAiProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider for the given endpoint and API key.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Request` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a provider from config, reading the key from the configured env var.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unavailable` when the key variable is unset or
    /// empty, or `ProviderError::Request` if the HTTP client cannot be built.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Unavailable(format!(
                    "missing API key in environment variable {}",
                    config.api_key_env
                ))
            })?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build an OpenAI API request from a completion request.
#[doc(hidden)]
pub fn build_request(request: &CompletionRequest) -> OpenAiRequest {
    let messages = request
        .messages
        .iter()
        .map(|msg| OpenAiMessage {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        })
        .collect();

    OpenAiRequest {
        model: request.model.clone(),
        messages,
        stream: false,
    }
}

/// Parse an OpenAI API response into a completion response.
///
/// Only the body must be JSON. Fields are read leniently: a missing or
/// mistyped `choices` yields an empty list and a missing role reads as
/// `assistant`, so shape problems surface from
/// [`crate::completion::validate_completion`] rather than here.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body is not valid JSON.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<CompletionResponse, ProviderError> {
    let resp: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let choices: Vec<Choice> = resp
        .get("choices")
        .and_then(Value::as_array)
        .map(|choices| {
            choices
                .iter()
                .enumerate()
                .map(|(position, choice)| parse_choice(position, choice))
                .collect()
        })
        .unwrap_or_default();

    let usage = resp
        .get("usage")
        .filter(|usage| usage.is_object())
        .map(|usage| UsageStats {
            input_tokens: u32_field(usage, "prompt_tokens").unwrap_or(0),
            output_tokens: u32_field(usage, "completion_tokens").unwrap_or(0),
        });

    Ok(CompletionResponse {
        id: str_field(&resp, "id").unwrap_or_default(),
        model: str_field(&resp, "model").unwrap_or_default(),
        choices,
        usage,
    })
}

fn parse_choice(position: usize, choice: &Value) -> Choice {
    let message = choice.get("message").unwrap_or(&Value::Null);
    let role = match message.get("role") {
        None | Some(Value::Null) => Role::Assistant.as_str().to_owned(),
        Some(Value::String(role)) => role.clone(),
        Some(other) => other.to_string(),
    };

    Choice {
        index: u32_field(choice, "index")
            .or_else(|| u32::try_from(position).ok())
            .unwrap_or_default(),
        message: ChoiceMessage {
            role,
            content: str_field(message, "content"),
            refusal: str_field(message, "refusal"),
        },
        finish_reason: str_field(choice, "finish_reason"),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn u32_field(value: &Value, key: &str) -> Option<u32> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_request = build_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
