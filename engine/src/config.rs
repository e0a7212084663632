use serde::Deserialize;
use std::{env, path::Path, path::PathBuf};

use spark_types::{ApiKey, ModelName, ui::UiOptions};

/// Environment fallback for the credential when the config has none.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Default, Deserialize)]
pub struct SparkConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub model: Option<String>,
    /// Use ASCII-only glyphs for avatars and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze the typing indicator animation.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub google: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let google = if self.google.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("google", &google).finish()
    }
}

/// Gemini endpoint overrides.
///
/// ```toml
/// [google]
/// base_url = "https://generativelanguage.googleapis.com/v1"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct GoogleConfig {
    pub base_url: Option<String>,
}

/// Replace `${VAR}` references with environment values. Unset variables become empty.
pub fn expand_env_vars(value: &str) -> String {
    expand_env_vars_with(value, |name| env::var(name).ok())
}

/// [`expand_env_vars`] with an explicit variable lookup.
pub fn expand_env_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        let end = start + 2 + end_rel;
        let var = &rest[start + 2..end];
        if var.is_empty() {
            out.push_str(&rest[..=end]);
        } else {
            out.push_str(&rest[..start]);
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &rest[end + 1..];
    }

    out.push_str(rest);
    out
}

impl SparkConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(source) => {
                tracing::warn!("Failed to parse config at {}: {source}", path.display());
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Configured model, falling back to the default when absent or invalid.
    #[must_use]
    pub fn model(&self) -> ModelName {
        let Some(raw) = self.app.as_ref().and_then(|app| app.model.as_deref()) else {
            return ModelName::default();
        };
        ModelName::parse(raw).unwrap_or_else(|err| {
            tracing::warn!("Invalid model in config: {err}");
            ModelName::default()
        })
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app
            .as_ref()
            .map(|app| UiOptions {
                ascii_only: app.ascii_only,
                high_contrast: app.high_contrast,
                reduced_motion: app.reduced_motion,
            })
            .unwrap_or_default()
    }

    /// Endpoint override, if one is set and non-blank.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.google
            .as_ref()
            .and_then(|google| google.base_url.as_deref())
            .map(expand_env_vars)
            .filter(|url| !url.trim().is_empty())
    }
}

/// Resolve the Gemini credential: config entry first (after `${VAR}`
/// expansion), then `GEMINI_API_KEY`. Blank values count as missing.
pub fn resolve_api_key(
    config: Option<&SparkConfig>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<ApiKey> {
    let from_config = config
        .and_then(|cfg| cfg.api_keys.as_ref())
        .and_then(|keys| keys.google.as_deref())
        .and_then(|raw| ApiKey::new(expand_env_vars_with(raw, &lookup)));

    from_config.or_else(|| lookup(GEMINI_API_KEY_ENV).and_then(ApiKey::new))
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".spark").join("config.toml"))
}
