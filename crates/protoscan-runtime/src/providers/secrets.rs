//! Secure credential handling for LLM backends.
//!
//! API keys are wrapped in [`ApiCredential`] at load time:
//!
//! - **No accidental logging**: credentials cannot appear in Debug/Display
//!   output
//! - **Memory safety**: the underlying value is zeroed on drop via the
//!   `secrecy` crate
//! - **Explicit exposure**: the raw value is only reachable through
//!   [`ApiCredential::expose`], called at the point of use

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ConfigError;

/// Where a credential was loaded from. Useful when debugging configuration
/// without exposing the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically (tests, embedding applications)
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    provider: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value. After this point the value cannot be
    /// accidentally logged.
    pub fn new(
        value: impl Into<String>,
        source: CredentialSource,
        provider: &'static str,
    ) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            provider,
        }
    }

    /// Load a credential from an environment variable.
    ///
    /// A missing variable is a startup configuration error, raised before
    /// any network attempt.
    pub fn from_env(env_var: &'static str, provider: &'static str) -> Result<Self, ConfigError> {
        std::env::var(env_var)
            .map(|value| Self::new(value, CredentialSource::Environment, provider))
            .map_err(|_| ConfigError::MissingCredential { provider, env_var })
    }

    /// Expose the credential for use in an HTTP header.
    ///
    /// Only call at the point of use; never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Where this credential came from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("provider", &self.provider)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} key from {} [REDACTED]", self.provider, self.source)
    }
}
