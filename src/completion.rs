//! Helpers around a single chat completion: response validation, text
//! extraction, request serialization, and classification of provider
//! failures into [`ModelCompletionError`].

use serde_json::{json, Value};

use crate::providers::{CompletionRequest, CompletionResponse, ProviderError, Role};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed model call, classified for callers and telemetry.
///
/// `message` is safe to show to a user; `body` carries diagnostic detail for
/// logs.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ModelCompletionError {
    /// Human-readable description.
    pub message: String,
    /// Opaque diagnostic payload.
    pub body: Value,
    /// Underlying provider failure.
    #[source]
    pub source: ProviderError,
}

impl From<ProviderError> for ModelCompletionError {
    fn from(source: ProviderError) -> Self {
        let (message, body) = match &source {
            ProviderError::Request(err) if err.is_timeout() => (
                "The model provider did not respond in time.".to_owned(),
                json!({ "kind": "timeout", "error": err.to_string() }),
            ),
            ProviderError::Request(err) => (
                "The model provider could not be reached.".to_owned(),
                json!({ "kind": "connection", "error": err.to_string() }),
            ),
            ProviderError::HttpStatus { status, body } => {
                let message = match status {
                    429 => format!(
                        "The model provider rate limited the request (status {status}); back off before retrying."
                    ),
                    401 | 403 => format!(
                        "The model provider rejected the credentials (status {status})."
                    ),
                    _ => format!("The model provider returned an error status ({status})."),
                };
                (
                    message,
                    json!({ "kind": "status", "status_code": status, "response": body }),
                )
            }
            ProviderError::Parse(detail) => (
                "The model provider returned a response that could not be parsed.".to_owned(),
                json!({ "kind": "parse", "error": detail }),
            ),
            ProviderError::Unavailable(detail) => (
                format!("The model provider is unavailable: {detail}"),
                json!({ "kind": "unavailable", "error": detail }),
            ),
        };
        Self {
            message,
            body,
            source,
        }
    }
}

/// A completion that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The response carried no choices.
    #[error("completion has no choices")]
    NoChoices,
    /// The primary choice was not authored by the assistant.
    #[error("primary choice has unexpected role '{0}'")]
    UnexpectedRole(String),
    /// The model declined to answer.
    #[error("model refused the request: {0}")]
    Refusal(String),
    /// Generation stopped before completing.
    #[error("completion stopped early: {0}")]
    Incomplete(String),
    /// The primary choice has no text content.
    #[error("primary choice has no content")]
    MissingContent,
}

// ---------------------------------------------------------------------------
// Validation and extraction
// ---------------------------------------------------------------------------

/// Check that a completion has a usable primary choice.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_completion(response: &CompletionResponse) -> Result<(), ValidationError> {
    let choice = response.choices.first().ok_or(ValidationError::NoChoices)?;
    if choice.message.role != Role::Assistant.as_str() {
        return Err(ValidationError::UnexpectedRole(choice.message.role.clone()));
    }
    if let Some(refusal) = &choice.message.refusal {
        return Err(ValidationError::Refusal(refusal.clone()));
    }
    if let Some(reason @ ("length" | "content_filter")) = choice.finish_reason.as_deref() {
        return Err(ValidationError::Incomplete(reason.to_owned()));
    }
    if choice.message.content.is_none() {
        return Err(ValidationError::MissingContent);
    }
    Ok(())
}

/// Text of the primary choice, or empty when there is none.
pub fn message_content_from_completion(response: &CompletionResponse) -> &str {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .unwrap_or_default()
}

/// Lossless JSON form of a request for logs and telemetry.
pub fn serializable_completion_args(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();
    json!({ "model": request.model, "messages": messages })
}

/// Trim whitespace, then strip one `"` from each outer edge.
///
/// Interior quotes are kept, and whitespace exposed by quote removal is not
/// trimmed again.
pub fn clean_query(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_owned()
}

/// Join observations with `"\n- "`; an empty list gives an empty string.
pub fn join_observations(observations: &[String]) -> String {
    observations.join("\n- ")
}
