//! Completion failures and their user-facing classification.
//!
//! Every failure ends up as an ordinary bot message. The text is chosen by
//! [`classify_failure`], which scans the raw error for marker substrings. The
//! markers depend on third-party error wording, so the rules live in this one
//! function and nowhere else.

use std::error::Error as _;

use reqwest::StatusCode;

/// Fallback when the remote `error` object carries no usable message.
pub const GENERIC_REMOTE_ERROR: &str = "API Error";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The response body carried an `error` object.
    #[error("{message}")]
    Remote {
        status: StatusCode,
        message: String,
        /// `error.details[].reason` values, e.g. `API_KEY_INVALID`.
        reasons: Vec<String>,
    },
    /// Connection, TLS or body read failure. The URL (which embeds the key) is stripped.
    #[error("{}", transport_message(.0))]
    Transport(reqwest::Error),
    /// The body could not be parsed as JSON.
    #[error("invalid response (HTTP {status}): {source}")]
    InvalidBody {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.without_url())
    }
}

/// Flatten the source chain; reqwest's top-level text alone ("error sending request") hides the cause.
fn transport_message(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl CompletionError {
    /// Text the classifier scans: the message plus any structured reasons.
    #[must_use]
    pub fn classification_text(&self) -> String {
        match self {
            CompletionError::Remote {
                message, reasons, ..
            } if !reasons.is_empty() => format!("{message} [{}]", reasons.join(", ")),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        classify_failure(&self.classification_text())
    }

    /// The bot message shown in place of a reply.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.failure_kind().user_message(&self.to_string())
    }
}

/// User-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidCredential,
    EndpointNotActivated,
    AccessDenied,
    GenericRemoteFailure,
}

impl FailureKind {
    /// Display text for this category. Only the generic category embeds `raw`.
    #[must_use]
    pub fn user_message(self, raw: &str) -> String {
        match self {
            FailureKind::InvalidCredential => "❌ Invalid API key! Check GEMINI_API_KEY or the \
                 [api_keys] google entry in your config file."
                .to_string(),
            FailureKind::EndpointNotActivated => "❌ API not activated or model error! Visit \
                 https://aistudio.google.com/ and run a test prompt to activate your key. \
                 If the error persists, there might be a billing or model access issue."
                .to_string(),
            FailureKind::AccessDenied => "❌ API access denied! Make sure the \"Generative \
                 Language API\" is enabled for your project."
                .to_string(),
            FailureKind::GenericRemoteFailure => format!(
                "❌ Error: {raw}\n\nPlease check your network connection and API key status."
            ),
        }
    }
}

/// Pick a category from raw error text. First match wins; matching is case-sensitive.
#[must_use]
pub fn classify_failure(raw: &str) -> FailureKind {
    if raw.contains("API_KEY_INVALID") {
        FailureKind::InvalidCredential
    } else if raw.contains("404") || raw.contains("not found") {
        FailureKind::EndpointNotActivated
    } else if raw.contains("403") {
        FailureKind::AccessDenied
    } else {
        FailureKind::GenericRemoteFailure
    }
}
