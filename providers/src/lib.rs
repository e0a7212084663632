//! Gemini completion client.
//!
//! # Architecture
//!
//! - [`gemini`] - one-shot `generateContent` call: request body, response
//!   interpretation, [`gemini::GeminiClient`]
//! - [`errors`] - [`CompletionError`] and the failure classification that turns
//!   any error into user-facing chat text
//!
//! # Configuration
//!
//! Use [`ApiConfig`] to bundle the credential, model and endpoint base URL.
//!
//! # Error Handling
//!
//! A structurally incomplete response (no candidate, no text, safety block) is
//! not an error: it resolves to [`gemini::Completion::Blocked`]. Everything else
//! that goes wrong becomes a [`CompletionError`], which callers render through
//! [`CompletionError::user_message`].

pub mod errors;
pub mod gemini;

pub use errors::{CompletionError, FailureKind, classify_failure};
pub use gemini::{Completion, GeminiClient, SAFETY_FALLBACK_REPLY};
pub use spark_types;

use std::time::Duration;

use spark_types::{ApiKey, ModelName};

/// Canonical Gemini API base URL (stable `v1` surface).
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

const USER_AGENT: &str = concat!("spark/", env!("CARGO_PKG_VERSION"));

// Note: reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Hardened client settings shared by every request.
///
/// No overall request timeout: a call runs until the server answers or the
/// connection fails.
fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(USER_AGENT)
}

/// Build an HTTP client for `base_url`.
///
/// HTTPS is enforced for `https://` endpoints; plain `http://` is only
/// reachable when explicitly configured (local proxies, mock servers).
pub fn http_client_for(base_url: &str) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(base_url.starts_with("https://")).build()
}

/// Credential + model + endpoint for the completion client.
///
/// ```rust
/// use spark_providers::ApiConfig;
/// use spark_types::{ApiKey, ModelName};
///
/// let key = ApiKey::new("test").expect("non-empty key");
/// let config = ApiConfig::new(key, ModelName::default())
///     .with_base_url("http://127.0.0.1:8080/v1/");
/// assert_eq!(config.base_url(), "http://127.0.0.1:8080/v1");
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    api_key: ApiKey,
    model: ModelName,
    base_url: String,
}

impl ApiConfig {
    #[must_use]
    pub fn new(api_key: ApiKey, model: ModelName) -> Self {
        Self {
            api_key,
            model,
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint base (trailing slashes are dropped).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, GEMINI_API_BASE_URL};
    use spark_types::{ApiKey, ModelName};

    #[test]
    fn api_config_defaults_to_public_endpoint() {
        let config = ApiConfig::new(ApiKey::new("k").unwrap(), ModelName::default());
        assert_eq!(config.base_url(), GEMINI_API_BASE_URL);
        assert_eq!(config.model().as_str(), "gemini-2.5-flash");
        assert_eq!(config.api_key(), "k");
    }

    #[test]
    fn api_config_debug_hides_key() {
        let config = ApiConfig::new(ApiKey::new("AIza-very-secret").unwrap(), ModelName::default());
        assert!(!format!("{config:?}").contains("AIza-very-secret"));
    }

    #[test]
    fn http_client_builds_for_both_schemes() {
        assert!(super::http_client_for("https://example.invalid/v1").is_ok());
        assert!(super::http_client_for("http://127.0.0.1:1/v1").is_ok());
    }
}
