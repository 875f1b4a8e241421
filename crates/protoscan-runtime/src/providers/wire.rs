//! Shared wire plumbing for chat-completion backends.
//!
//! Groq and OpenAI speak the same chat-completions dialect; the request and
//! response shapes live here so each provider file only supplies its
//! endpoint, headers, and model. Anthropic's Messages API differs enough to
//! keep its own types in `anthropic.rs`.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use super::ProviderError;

/// Shared HTTP client. Per-request timeouts come from [`crate::RequestParams`],
/// so the builder itself carries none.
pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .build()
            .expect("failed to build HTTP client")
    })
}

/// Chat-completions request body (Groq and OpenAI dialect).
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Native structured-output hint: instructs the backend to emit only a JSON
/// object.
#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// First choice's content, or [`ProviderError::EmptyResponse`].
    pub fn into_content(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}

/// Error body shape shared by the chat-completions backends.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

/// Map a send-stage failure (connect, DNS, timeout) to a transport error.
pub(crate) fn classify_send_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Http(err.to_string())
    }
}

/// Map a non-2xx status to a distinguishable transport error.
///
/// Authentication rejection (401/403) and rate limiting (429) get their own
/// kinds so the caller can tell a terminal credential problem from a
/// transient one. The credential itself never appears in the message.
pub(crate) fn classify_status(
    provider: &'static str,
    status: u16,
    retry_after_secs: Option<u64>,
    message: String,
) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth { provider },
        429 => ProviderError::RateLimited {
            retry_after: retry_after_secs.map(Duration::from_secs),
        },
        _ => ProviderError::Api { status, message },
    }
}

/// Drain a failed response into a transport error.
pub(crate) async fn read_failure(
    provider: &'static str,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("{} returned an unreadable error body", provider),
    };

    classify_status(provider, status, retry_after, message)
}
