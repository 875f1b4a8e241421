//! Provider selection from configuration.
//!
//! A [`ProviderRegistry`] maps backend identifiers to factories and turns
//! the configured name into a ready [`LlmProvider`] at process start.
//! Selection is case-sensitive over a closed set; an unknown name or a
//! missing credential is a startup failure, never a request-time one.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    AnthropicProviderFactory, ConfigError, GroqProviderFactory, LlmProvider, OpenAiProviderFactory,
};

/// Environment variable naming the active backend.
pub const LLM_PROVIDER_ENV: &str = "LLM_PROVIDER";

/// Backend used when `LLM_PROVIDER` is unset.
const DEFAULT_PROVIDER: &str = "groq";

/// Factory for creating one backend from the process environment.
///
/// Implement this to add a new backend: register the factory and the
/// registry picks it up, no enum edits anywhere.
pub trait ProviderFactory: Send + Sync {
    /// Unique identifier, e.g. `"groq"`, `"claude"`, `"openai"`.
    fn provider_type(&self) -> &'static str;

    /// Create a configured provider. Credential loading happens here, so a
    /// missing key fails before any request is attempted.
    fn create(&self) -> Result<Arc<dyn LlmProvider>, ConfigError>;

    /// Human-readable description.
    fn description(&self) -> &'static str {
        "LLM provider"
    }
}

/// Registry of available provider factories.
///
/// Stateless beyond its factory table; safe to share and to drop once the
/// provider has been selected.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the three built-in backends registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GroqProviderFactory));
        registry.register(Arc::new(AnthropicProviderFactory));
        registry.register(Arc::new(OpenAiProviderFactory));
        registry
    }

    /// Register a factory, replacing any existing one of the same type.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type(), factory);
    }

    /// Create the provider registered under `name` (case-sensitive).
    pub fn create(&self, name: &str) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        self.factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
                available: self.available_types(),
            })?
            .create()
    }

    /// Select the provider named by `LLM_PROVIDER`, defaulting to `groq`.
    pub fn select_from_env(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let name =
            std::env::var(LLM_PROVIDER_ENV).unwrap_or_else(|_| DEFAULT_PROVIDER.to_string());
        tracing::debug!(provider = %name, "selecting LLM provider");
        self.create(&name)
    }

    /// List registered backend identifiers.
    pub fn available_types(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Whether a backend identifier is registered.
    pub fn has_provider(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_the_closed_set() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(registry.available_types(), vec!["claude", "groq", "openai"]);
        assert!(registry.has_provider("groq"));
        assert!(!registry.has_provider("mistral"));
    }

    #[test]
    fn unknown_provider_fails_before_any_network_attempt() {
        let registry = ProviderRegistry::with_defaults();
        let err = registry.create("gemini").unwrap_err();
        match err {
            ConfigError::UnknownProvider { name, available } => {
                assert_eq!(name, "gemini");
                assert_eq!(available, vec!["claude", "groq", "openai"]);
            }
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }

    #[test]
    fn selection_is_case_sensitive() {
        let registry = ProviderRegistry::with_defaults();
        assert!(matches!(
            registry.create("Groq"),
            Err(ConfigError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn create_with_credential_present_succeeds() {
        std::env::set_var("GROQ_API_KEY", "gsk-test-key");
        let registry = ProviderRegistry::with_defaults();
        let provider = registry.create("groq").unwrap();
        assert_eq!(provider.name(), "groq");
        assert!(provider.supports_json_mode());
    }

    #[test]
    fn registering_a_fourth_backend_is_additive() {
        struct FakeFactory;
        impl ProviderFactory for FakeFactory {
            fn provider_type(&self) -> &'static str {
                "fake"
            }
            fn create(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
                Err(ConfigError::MissingCredential {
                    provider: "fake",
                    env_var: "FAKE_API_KEY",
                })
            }
        }

        let mut registry = ProviderRegistry::with_defaults();
        registry.register(Arc::new(FakeFactory));
        assert!(registry.has_provider("fake"));
        assert!(matches!(
            registry.create("fake"),
            Err(ConfigError::MissingCredential { .. })
        ));
    }
}
