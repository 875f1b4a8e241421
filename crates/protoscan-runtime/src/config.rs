//! Per-operation request parameters.

use std::time::Duration;

/// Request timeout applied to every backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling and budget parameters for one completion request.
///
/// Fixed per operation rather than user-tunable: low temperature minimizes
/// run-to-run variance for structured extraction, and the token ceiling
/// bounds cost and latency while leaving room for the worst-case finding
/// list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestParams {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Request timeout
    pub timeout: Duration,
}

impl RequestParams {
    /// Parameters for the protocol analysis operation.
    pub fn analysis() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parameters for generating a fix for one issue.
    pub fn fix() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 1000,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parameters for rewriting a protocol with fixes applied.
    pub fn improvement() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 4000,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parameters for reagent extraction.
    pub fn procurement() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 2500,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
