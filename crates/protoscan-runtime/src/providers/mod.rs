//! LLM provider abstractions.
//!
//! The [`LlmProvider`] trait carries the analysis operations as provided
//! methods; each backend implements only [`LlmProvider::complete`] (request
//! construction and transport) plus a few descriptors. This keeps the
//! prompt/parse skeleton in one place and makes every backend behave
//! identically above the wire.
//!
//! ## Security
//!
//! All backends store their API key in an [`ApiCredential`], which cannot
//! be printed via `Debug`/`Display` and is zeroed on drop. See [`secrets`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use protoscan_core::model::{AnalysisResult, AppliedFix, FixPlan, ImprovedProtocol, ShoppingList};
use protoscan_core::parser::{self, ParseError};
use protoscan_core::prompts;

use crate::config::RequestParams;

mod anthropic;
mod factory;
mod groq;
mod openai;
pub mod secrets;
mod wire;

pub use anthropic::{AnthropicProvider, AnthropicProviderFactory};
pub use factory::{ProviderFactory, ProviderRegistry, LLM_PROVIDER_ENV};
pub use groq::{GroqProvider, GroqProviderFactory};
pub use openai::{OpenAiProvider, OpenAiProviderFactory};
pub use secrets::{ApiCredential, CredentialSource};

/// Startup-time configuration failures.
///
/// Fatal: the process must not serve requests after one of these. Raised
/// before any network attempt.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown provider '{name}', available: {available:?}")]
    UnknownProvider {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("{provider} credential not set: configure the {env_var} environment variable")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },
}

/// Per-request transport failures.
///
/// These mean no analysis was produced at all, unlike a parse failure on
/// the analysis path, which degrades in-band. Never includes credential
/// material.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{provider} rejected the credential")]
    Auth { provider: &'static str },

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("backend error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("backend response missing expected content")]
    EmptyResponse,

    #[error("model returned an unusable payload: {0}")]
    Parse(#[from] ParseError),
}

/// One backend-specific implementation of the analysis capability.
///
/// Backends differ in network protocol, authentication, and structured
/// output support; everything above the wire is shared via the provided
/// methods below. Implementations hold no mutable request-time state and
/// are safe to share across concurrent calls.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Execute one completion: send `system` and `user` to the backend with
    /// the given parameters and return the raw text output.
    ///
    /// Single attempt, no retry. Implementations that support native
    /// structured output should request a JSON-only response.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &RequestParams,
    ) -> Result<String, ProviderError>;

    /// Provider identifier for logs and the registry.
    fn name(&self) -> &'static str;

    /// Whether the backend can be instructed to emit only JSON.
    ///
    /// Backends without this rely entirely on the parser's fallback chain;
    /// that asymmetry is deliberate and tested, not an oversight.
    fn supports_json_mode(&self) -> bool;

    /// Cheap liveness check: credential present, no network call.
    fn is_configured(&self) -> bool;

    /// Analyze a protocol and return a structured risk assessment.
    ///
    /// Parse failures never surface here: unusable model output degrades to
    /// a sentinel-valued result with the raw text retained.
    async fn analyze_protocol(&self, protocol_text: &str) -> Result<AnalysisResult, ProviderError> {
        let prompt = prompts::build_analysis_prompt(protocol_text);
        tracing::debug!(provider = self.name(), prompt_chars = prompt.len(), "dispatching analysis");
        let raw = self
            .complete(prompts::ANALYST_SYSTEM_PROMPT, &prompt, &RequestParams::analysis())
            .await?;
        Ok(parser::parse_analysis(&raw))
    }

    /// Generate a concrete fix for one identified issue.
    async fn generate_fix(
        &self,
        issue: &str,
        description: &str,
        protocol_context: &str,
    ) -> Result<FixPlan, ProviderError> {
        let prompt = prompts::build_fix_prompt(issue, description, protocol_context);
        let raw = self
            .complete(prompts::FIX_SYSTEM_PROMPT, &prompt, &RequestParams::fix())
            .await?;
        Ok(parser::parse_json_payload(&raw)?)
    }

    /// Apply selected fixes to the protocol and re-estimate success.
    async fn improve_protocol(
        &self,
        original_protocol: &str,
        fixes: &[AppliedFix],
    ) -> Result<ImprovedProtocol, ProviderError> {
        let prompt = prompts::build_improvement_prompt(original_protocol, fixes);
        let raw = self
            .complete(prompts::EDITOR_SYSTEM_PROMPT, &prompt, &RequestParams::improvement())
            .await?;
        Ok(parser::parse_json_payload(&raw)?)
    }

    /// Extract the Materials section into a priced shopping list.
    ///
    /// The total is recomputed locally from item prices; the model's own
    /// arithmetic is not trusted.
    async fn extract_reagents(&self, protocol_text: &str) -> Result<ShoppingList, ProviderError> {
        let prompt = prompts::build_reagent_prompt(protocol_text);
        let raw = self
            .complete(prompts::PROCUREMENT_SYSTEM_PROMPT, &prompt, &RequestParams::procurement())
            .await?;
        let mut list: ShoppingList = parser::parse_json_payload(&raw)?;
        list.recompute_total();
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend stub that returns a canned response or a canned error.
    #[derive(Debug)]
    struct ScriptedBackend {
        response: Result<String, fn() -> ProviderError>,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
            }
        }

        fn failing(err: fn() -> ProviderError) -> Self {
            Self { response: Err(err) }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedBackend {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _params: &RequestParams,
        ) -> Result<String, ProviderError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn supports_json_mode(&self) -> bool {
            false
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn analyze_parses_canned_json() {
        let backend = ScriptedBackend::replying(
            r#"{"success_probability": 70, "warnings": [{"issue": "a", "description": "b"}]}"#,
        );
        let result = backend.analyze_protocol("some protocol").await.unwrap();
        assert_eq!(result.success_probability, 70);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn analyze_degrades_on_prose_instead_of_erroring() {
        let backend = ScriptedBackend::replying("I refuse to emit JSON.");
        let result = backend.analyze_protocol("some protocol").await.unwrap();
        assert_eq!(result.success_probability, 0);
        assert_eq!(result.raw_analysis, "I refuse to emit JSON.");
        assert_eq!(result.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn analyze_propagates_transport_failures() {
        let backend = ScriptedBackend::failing(|| ProviderError::Auth { provider: "scripted" });
        let err = backend.analyze_protocol("some protocol").await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth { .. }));
    }

    #[tokio::test]
    async fn generate_fix_is_strict_about_shape() {
        let backend = ScriptedBackend::replying("no json here");
        let err = backend.generate_fix("issue", "desc", "ctx").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(ParseError::NoJsonFound)));
    }

    #[tokio::test]
    async fn generate_fix_accepts_fenced_payload() {
        let backend = ScriptedBackend::replying(
            "```json\n{\"fix_suggestion\": \"Add n=3\", \"implementation_steps\": []}\n```",
        );
        let plan = backend.generate_fix("issue", "desc", "ctx").await.unwrap();
        assert_eq!(plan.fix_suggestion, "Add n=3");
    }

    #[tokio::test]
    async fn extract_reagents_recomputes_total() {
        let backend = ScriptedBackend::replying(
            r#"{"categories": [{"name": "Buffers & Solutions", "items": [
                {"name": "PBS", "estimated_price": 40.0},
                {"name": "TBST", "estimated_price": 35.0}
            ]}], "total_cost": 123456.0}"#,
        );
        let list = backend.extract_reagents("Materials: PBS, TBST").await.unwrap();
        assert_eq!(list.total_cost, 75.0);
    }

    #[tokio::test]
    async fn improve_protocol_decodes_typed_payload() {
        let backend = ScriptedBackend::replying(
            r#"{"improved_protocol": "new text", "changes_made": ["added control"], "new_success_probability": 80}"#,
        );
        let improved = backend.improve_protocol("old text", &[]).await.unwrap();
        assert_eq!(improved.new_success_probability, 80);
        assert_eq!(improved.changes_made, vec!["added control"]);
    }
}
