//! Gemini `generateContent` client.
//!
//! One prompt in, one reply out. No history, no streaming, no retries.

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::errors::{CompletionError, GENERIC_REMOTE_ERROR};
use crate::{ApiConfig, http_client_for};

/// Reply used when the response has no candidate text (safety block, empty candidates).
pub const SAFETY_FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response. The response might have been blocked due to safety settings.";

/// Successful outcome of a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Reply(String),
    /// The response was structurally incomplete. Not an error.
    Blocked,
}

impl Completion {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Completion::Reply(text) => text,
            Completion::Blocked => SAFETY_FALLBACK_REPLY,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Completion::Reply(text) => text,
            Completion::Blocked => SAFETY_FALLBACK_REPLY.to_string(),
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Completion::Blocked)
    }
}

/// Single-turn request body: the prompt is the only content part.
#[must_use]
pub fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ]
    })
}

/// Interpret a `generateContent` response body, whatever the HTTP status.
///
/// An `error` object wins over everything else. Without one, the reply is the
/// first candidate's first part; any missing link yields [`Completion::Blocked`].
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Completion, CompletionError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|source| CompletionError::InvalidBody { status, source })?;

    if let Some(error) = json.get("error").filter(|error| is_truthy(error)) {
        return Err(remote_error(status, error));
    }

    let text = json
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty());

    Ok(match text {
        Some(text) => Completion::Reply(text.to_string()),
        None => Completion::Blocked,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn remote_error(status: StatusCode, error: &Value) -> CompletionError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(GENERIC_REMOTE_ERROR)
        .to_string();

    let reasons = error
        .get("details")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .filter_map(|detail| detail.get("reason").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    CompletionError::Remote {
        status,
        message,
        reasons,
    }
}

/// HTTP client bound to one credential, model and endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = http_client_for(config.base_url())?;
        Ok(Self { config, http })
    }

    /// Full request URL. Contains the credential; never log it.
    fn endpoint(&self) -> Result<reqwest::Url, CompletionError> {
        let raw = format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        );
        reqwest::Url::parse_with_params(&raw, &[("key", self.config.api_key())])
            .map_err(|e| CompletionError::InvalidEndpoint(e.to_string()))
    }

    /// Send one prompt and wait for the whole reply.
    ///
    /// There is no timeout: the call settles when the server answers or the
    /// connection fails.
    pub async fn generate(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let url = self.endpoint()?;
        tracing::debug!(
            model = %self.config.model(),
            prompt_chars = prompt.chars().count(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(url)
            .json(&build_request_body(prompt))
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let outcome = interpret_response(status, &body);
        match &outcome {
            Ok(Completion::Reply(text)) => {
                tracing::debug!(%status, reply_chars = text.chars().count(), "Completion received");
            }
            Ok(Completion::Blocked) => {
                tracing::warn!(%status, "Response carried no candidate text");
            }
            Err(e) => {
                tracing::warn!(%status, kind = ?e.failure_kind(), error = %e, "Completion failed");
            }
        }
        outcome
    }
}
