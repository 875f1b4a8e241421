//! Anthropic Claude backend (high reasoning).
//!
//! Uses the Messages API. Claude has no native structured-output switch, so
//! this backend relies entirely on the parser's fallback chain; that is the
//! one deliberate asymmetry among the three providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::secrets::{ApiCredential, CredentialSource};
use super::wire::{classify_send_error, classify_status, http_client};
use super::{ConfigError, LlmProvider, ProviderError, ProviderFactory};
use crate::config::RequestParams;

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    credential: ApiCredential,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(api_key, CredentialSource::Programmatic, "claude"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credential = ApiCredential::from_env(ANTHROPIC_API_KEY_ENV, "claude")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Messages API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Messages API response body.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesError {
    error: MessagesErrorDetail,
}

#[derive(Debug, Deserialize)]
struct MessagesErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &RequestParams,
    ) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: params.max_tokens,
            system,
            messages: vec![UserMessage {
                role: "user",
                content: user,
            }],
            temperature: params.temperature,
        };

        // The credential is exposed only here, at the point of use.
        let response = http_client()
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(params.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error(e, params.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let message = match response.json::<MessagesError>().await {
                Ok(body) => body.error.message,
                Err(_) => "claude returned an unreadable error body".to_string(),
            };
            return Err(classify_status("claude", status.as_u16(), retry_after, message));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "claude"
    }

    fn supports_json_mode(&self) -> bool {
        false
    }

    fn is_configured(&self) -> bool {
        !self.credential.is_empty()
    }
}

/// Factory registering the Claude backend under `"claude"`.
pub struct AnthropicProviderFactory;

impl ProviderFactory for AnthropicProviderFactory {
    fn provider_type(&self) -> &'static str {
        "claude"
    }

    fn create(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        Ok(Arc::new(AnthropicProvider::from_env()?))
    }

    fn description(&self) -> &'static str {
        "Anthropic Claude messages (high reasoning, no native JSON output)"
    }
}
