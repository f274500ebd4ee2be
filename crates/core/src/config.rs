use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";
pub const TIMEOUT_VAR: &str = "PDF_CHAT_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Fixed sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 500,
        }
    }
}

#[derive(Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub deployment: String,
    pub api_version: String,
    pub timeout: Duration,
    pub params: GenerationParams,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("params", &self.params)
            .finish()
    }
}

impl CompletionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves every setting through `lookup`. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let api_key = required(API_KEY_VAR)?;
        let raw_endpoint = required(ENDPOINT_VAR)?;
        let deployment = required(DEPLOYMENT_VAR)?;
        let api_version = required(API_VERSION_VAR)?;

        let endpoint = Url::parse(&raw_endpoint).map_err(|error| ConfigError::InvalidEndpoint {
            endpoint: raw_endpoint.clone(),
            details: error.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: raw_endpoint,
                details: "scheme must be http or https".to_string(),
            });
        }

        let timeout_secs = match lookup(TIMEOUT_VAR).map(|value| value.trim().to_string()) {
            Some(value) if !value.is_empty() => {
                value.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                    ConfigError::Invalid {
                        name: TIMEOUT_VAR,
                        details: format!("expected a positive number of seconds, got {value:?}"),
                    }
                })?
            }
            _ => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            endpoint,
            deployment,
            api_version,
            timeout: Duration::from_secs(timeout_secs),
            params: GenerationParams::default(),
        })
    }
}
