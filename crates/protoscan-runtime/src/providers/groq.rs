//! Groq backend (fast inference).
//!
//! Speaks the OpenAI-compatible chat-completions dialect and supports
//! native structured output via `response_format: json_object`.

use async_trait::async_trait;

use super::secrets::{ApiCredential, CredentialSource};
use super::wire::{
    classify_send_error, http_client, read_failure, ChatMessage, ChatRequest, ChatResponse,
    ResponseFormat,
};
use super::{ConfigError, LlmProvider, ProviderError, ProviderFactory};
use crate::config::RequestParams;
use std::sync::Arc;

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq provider.
pub struct GroqProvider {
    credential: ApiCredential,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GroqProvider {
    /// Create a provider with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(api_key, CredentialSource::Programmatic, "groq"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `GROQ_API_KEY` environment variable.
    ///
    /// Fails fast at startup when the credential is missing; no request is
    /// attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credential = ApiCredential::from_env(GROQ_API_KEY_ENV, "groq")?;
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
impl LlmProvider for GroqProvider {
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
            return Err(read_failure("groq", response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        body.into_content()
    }

    fn name(&self) -> &'static str {
        "groq"
    }

    fn supports_json_mode(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        !self.credential.is_empty()
    }
}

/// Factory registering the Groq backend under `"groq"`.
pub struct GroqProviderFactory;

impl ProviderFactory for GroqProviderFactory {
    fn provider_type(&self) -> &'static str {
        "groq"
    }

    fn create(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        Ok(Arc::new(GroqProvider::from_env()?))
    }

    fn description(&self) -> &'static str {
        "Groq chat completions (fast inference, native JSON output)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_descriptors() {
        let provider = GroqProvider::new("test-key");
        assert_eq!(provider.name(), "groq");
        assert!(provider.supports_json_mode());
        assert!(provider.is_configured());
        assert!(!GroqProvider::new("").is_configured());
    }

    #[test]
    fn api_key_not_in_debug_output() {
        let secret = "gsk-super-secret-12345";
        let provider = GroqProvider::new(secret);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains(secret), "API key exposed in Debug output!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn builder_overrides_apply() {
        let provider = GroqProvider::new("k")
            .with_base_url("http://localhost:9999/v1")
            .with_model("llama-guard");
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.model, "llama-guard");
    }

    #[test]
    fn factory_type_is_groq() {
        assert_eq!(GroqProviderFactory.provider_type(), "groq");
    }
}
