//! # protoscan-runtime
//!
//! Interchangeable LLM backends for protocol analysis.
//!
//! This crate is the only place network calls are made. It provides the
//! [`LlmProvider`] trait with one implementation per backend (Groq,
//! Anthropic, OpenAI) and a [`ProviderRegistry`] that selects a backend
//! from configuration at process start.
//!
//! ## Design
//!
//! - The analysis operations are provided methods on the trait; backends
//!   implement only request construction and transport. Adding a fourth
//!   backend is a local, additive change.
//! - Startup failures ([`ConfigError`]: unknown provider name, missing
//!   credential) are distinct from per-request transport failures
//!   ([`ProviderError`]), and imperfect model output is neither: the
//!   analysis parser always degrades in-band.
//! - No retries. A transport failure propagates immediately; a parse
//!   failure is recoverable without re-querying the backend.
//!
//! ## Example
//!
//! ```rust,ignore
//! use protoscan_runtime::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.select_from_env()?;
//! let result = provider.analyze_protocol(&protocol_text).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod config;
pub mod providers;

pub use config::RequestParams;
pub use providers::{
    AnthropicProvider, ConfigError, GroqProvider, LlmProvider, OpenAiProvider, ProviderError,
    ProviderFactory, ProviderRegistry,
};
