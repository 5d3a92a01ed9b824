//! Bounded client for the Anthropic Messages API, used only by extraction.
//!
//! Each call gets a per-request timeout and at most `max_retries` extra
//! attempts. Rate limits (429), 5xx responses and transport failures are
//! retried with exponential backoff. Other 4xx responses fail immediately.

pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Model used for extraction calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that turns a prompt into raw model text. Extraction depends on
/// this rather than on `LlmClient`, so it runs without network in tests.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<Block>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl MessagesResponse {
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text.as_deref())
    }
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(MessagesResponse),
    Retry(LlmError),
    Fatal(LlmError),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry `n` (1-based): 0.5s, 1s, 2s, ... capped at 32s.
fn backoff(n: u32) -> Duration {
    BACKOFF_BASE * (1u32 << n.saturating_sub(1).min(6))
}

// ── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    timeout: Duration,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration, max_retries: u32) -> Result<Self, LlmError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            api_key,
            timeout,
            max_retries,
        })
    }

    async fn attempt(&self, body: &MessagesRequest<'_>) -> Attempt {
        let sent = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await;

        let response = match sent {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Attempt::Retry(LlmError::Timeout(self.timeout)),
            Err(e) => return Attempt::Retry(LlmError::Http(e)),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<MessagesResponse>().await {
                Ok(parsed) => Attempt::Done(parsed),
                Err(e) => Attempt::Fatal(LlmError::Http(e)),
            };
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&raw)
            .map(|e| e.error.message)
            .unwrap_or(raw);
        let error = LlmError::Api {
            status: status.as_u16(),
            message,
        };
        if is_retryable(status) {
            Attempt::Retry(error)
        } else {
            Attempt::Fatal(error)
        }
    }

    async fn send(&self, prompt: &str, system: &str) -> Result<MessagesResponse, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_OUTPUT_TOKENS,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let attempts = self.max_retries + 1;
        let mut last = None;
        for n in 0..attempts {
            if n > 0 {
                tokio::time::sleep(backoff(n)).await;
            }
            match self.attempt(&body).await {
                Attempt::Done(response) => {
                    if let Some(usage) = &response.usage {
                        debug!(
                            "LLM call ok after {} attempt(s): {} in / {} out tokens",
                            n + 1,
                            usage.input_tokens,
                            usage.output_tokens
                        );
                    }
                    return Ok(response);
                }
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retry(e) => {
                    warn!("LLM attempt {}/{attempts} failed: {e}", n + 1);
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or(LlmError::Exhausted { attempts }))
    }
}

#[async_trait]
impl TextCompleter for LlmClient {
    /// Raw text of the first text block. Repair and normalization happen in
    /// the caller.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.send(prompt, system).await?;
        response
            .first_text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_skips_other_blocks() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use"},
                {"type": "text", "text": "{\"name\": \"Ada\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();
        assert_eq!(response.first_text(), Some("{\"name\": \"Ada\"}"));
    }

    #[test]
    fn test_only_rate_limits_and_server_errors_retry() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(2));
        assert_eq!(backoff(20), Duration::from_secs(32));
    }

    #[test]
    fn test_client_builds_with_configured_bounds() {
        let client = LlmClient::new("key".to_string(), Duration::from_secs(5), 2).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.max_retries, 2);
    }
}
