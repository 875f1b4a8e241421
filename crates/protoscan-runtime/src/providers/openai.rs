//! OpenAI backend (balanced cost).
//!
//! Same chat-completions dialect as Groq, different endpoint and default
//! model. Supports native structured output.

use async_trait::async_trait;

use super::secrets::{ApiCredential, CredentialSource};
use super::wire::{
    classify_send_error, http_client, read_failure, ChatMessage, ChatRequest, ChatResponse,
    ResponseFormat,
};
use super::{ConfigError, LlmProvider, ProviderError, ProviderFactory};
use crate::config::RequestParams;
use std::sync::Arc;

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI provider.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(api_key, CredentialSource::Programmatic, "openai"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credential = ApiCredential::from_env(OPENAI_API_KEY_ENV, "openai")?;
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

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &RequestParams,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        };

        let response = http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .timeout(params.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error(e, params.timeout))?;

        if !response.status().is_success() {
            return Err(read_failure("openai", response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        body.into_content()
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn supports_json_mode(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        !self.credential.is_empty()
    }
}

/// Factory registering the OpenAI backend under `"openai"`.
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    fn create(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        Ok(Arc::new(OpenAiProvider::from_env()?))
    }

    fn description(&self) -> &'static str {
        "OpenAI chat completions (cost-effective, native JSON output)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_descriptors() {
        let provider = OpenAiProvider::new("test-key");
        assert_eq!(provider.name(), "openai");
        assert!(provider.supports_json_mode());
    }

    #[test]
    fn api_key_not_in_debug_output() {
        let secret = "sk-super-secret-12345";
        let provider = OpenAiProvider::new(secret);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains(secret), "API key exposed in Debug output!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn factory_type_is_openai() {
        assert_eq!(OpenAiProviderFactory.provider_type(), "openai");
    }
}
