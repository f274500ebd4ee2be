//! Client for the hosted chat-completion service.

use crate::config::{CompletionConfig, GenerationParams};
use crate::error::{CompletionError, ConfigError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Turns an assembled prompt into generated text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct AzureOpenAiClient {
    client: Client,
    url: Url,
    api_key: String,
    deployment: String,
    params: GenerationParams,
    timeout_secs: u64,
}

impl AzureOpenAiClient {
    pub fn new(config: CompletionConfig) -> Result<Self, ConfigError> {
        let url = chat_completions_url(&config)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ConfigError::Invalid {
                name: "http client",
                details: error.to_string(),
            })?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key,
            deployment: config.deployment,
            params: config.params,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> CompletionError {
        if error.is_timeout() {
            CompletionError::Timeout(self.timeout_secs)
        } else {
            CompletionError::Upstream(format!("request failed: {error}"))
        }
    }
}

#[async_trait]
impl CompletionService for AzureOpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        debug!(
            deployment = %self.deployment,
            prompt_chars = prompt.chars().count(),
            "sending completion request"
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        if !status.is_success() {
            let error = classify_status(status, retry_after.as_deref(), &body);
            warn!(deployment = %self.deployment, status = status.as_u16(), %error, "completion request failed");
            return Err(error);
        }

        let answer = parse_completion_body(&body)?;
        info!(
            deployment = %self.deployment,
            elapsed_ms = started.elapsed().as_millis() as u64,
            answer_chars = answer.chars().count(),
            "completion received"
        );
        Ok(answer)
    }

    fn name(&self) -> &str {
        "azure-openai"
    }
}

fn chat_completions_url(config: &CompletionConfig) -> Result<Url, ConfigError> {
    let mut url = config.endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| ConfigError::InvalidEndpoint {
            endpoint: config.endpoint.to_string(),
            details: "endpoint cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .extend(["openai", "deployments", config.deployment.as_str(), "chat", "completions"]);
    url.query_pairs_mut()
        .clear()
        .append_pair("api-version", &config.api_version);
    Ok(url)
}

fn classify_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited {
            retry_after_secs: retry_after.and_then(|value| value.trim().parse().ok()),
        },
        // `Timeout` means the client's own deadline elapsed; a gateway timeout is the service's.
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CompletionError::Upstream(format!("service reported {status}"))
        }
        _ => {
            let details = error_message(body).unwrap_or_else(|| truncate(body, 200));
            CompletionError::Upstream(format!("{status}: {details}"))
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match (envelope.error.code, envelope.error.message) {
        (Some(code), Some(message)) => Some(format!("{code}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(code), None) => Some(code),
        (None, None) => None,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut = trimmed.chars().take(max_chars).collect::<String>();
    cut.push_str("...");
    cut
}

fn parse_completion_body(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|error| CompletionError::Upstream(format!("malformed response: {error}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Upstream("response contained no choices".to_string()))?;

    let content = choice
        .message
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(CompletionError::Upstream(
            "response contained an empty answer".to_string(),
        ));
    }

    Ok(content)
}
