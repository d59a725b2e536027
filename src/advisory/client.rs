//! Advisory clients
//!
//! [`HttpAdvisoryClient`] speaks an OpenAI-compatible chat-completions API.
//! [`RetryingAdvisory`] wraps any [`AdvisoryService`] with bounded retries and
//! exponential backoff, and converts exhaustion into the deterministic
//! default decision so the control loop always receives a usable answer.

use crate::advisory::parser::{parse_reply, ParseError};
use crate::advisory::Decision;
use crate::config::AdvisoryConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors produced by advisory clients
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("no API key configured")]
    NoApiKey,

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisory API returned status {status}")]
    Api { status: u16 },

    #[error("advisory response missing message content")]
    EmptyResponse,

    #[error("unparseable advisory reply: {0}")]
    Parse(#[from] ParseError),
}

impl AdvisoryError {
    /// Whether retrying the same query could plausibly succeed
    ///
    /// A missing API key never heals mid-session, so the wrapper skips
    /// straight to the default decision instead of burning backoff time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoApiKey)
    }
}

/// An external decision oracle
///
/// Implementations take a plain-text situational summary and return the
/// oracle's suggested next action. Output is untrusted: callers must treat
/// any error as "no usable advice".
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn advise(&self, prompt: &str) -> Result<Decision, AdvisoryError>;
}

// ===== HTTP client =====

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

const SYSTEM_PROMPT: &str =
    "You are an assistant deciding the next action for a paginated results crawler. \
     Reply with exactly two lines:\nAction: <paginate|extract|stop>\nReasoning: <one sentence>";

/// Advisory client for OpenAI-compatible chat-completions endpoints
pub struct HttpAdvisoryClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpAdvisoryClient {
    /// Creates a client from an advisory configuration
    ///
    /// The API key is read from the environment variable named by the
    /// configuration. An absent key is not an error here; queries will
    /// short-circuit to [`AdvisoryError::NoApiKey`] instead.
    pub fn from_config(config: &AdvisoryConfig) -> Result<Self, reqwest::Error> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                "{} not set; advisory queries will use the fallback decision",
                config.api_key_env
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Creates a client with an explicit key (used by tests)
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl AdvisoryService for HttpAdvisoryClient {
    async fn advise(&self, prompt: &str) -> Result<Decision, AdvisoryError> {
        let api_key = self.api_key.as_ref().ok_or(AdvisoryError::NoApiKey)?;

        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: 150,
            temperature: 0.5,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Api {
                status: status.as_u16(),
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AdvisoryError::EmptyResponse)?;

        Ok(parse_reply(&content)?)
    }
}

// ===== Retrying wrapper =====

/// Retrying wrapper around an [`AdvisoryService`]
///
/// Retries transport and parse failures up to a fixed attempt count with
/// exponential backoff. The control loop never sees an error: `query`
/// returns `None` on exhaustion and the decision policy substitutes its
/// local fallback.
pub struct RetryingAdvisory<S> {
    inner: S,
    max_attempts: u32,
    backoff_base: Duration,
}

impl<S: AdvisoryService> RetryingAdvisory<S> {
    /// Wraps a service with the given retry bounds
    pub fn new(inner: S, max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Queries the oracle
    ///
    /// # Arguments
    ///
    /// * `prompt` - Plain-text situational summary for the oracle
    ///
    /// # Returns
    ///
    /// * `Some(Decision)` - A parsed decision from the oracle
    /// * `None` - No usable advice after all attempts
    pub async fn query(&self, prompt: &str) -> Option<Decision> {
        for attempt in 0..self.max_attempts {
            match self.inner.advise(prompt).await {
                Ok(decision) => return Some(decision),
                Err(e) if !e.is_retryable() => {
                    tracing::debug!("Advisory unavailable without retry: {}", e);
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        "Advisory attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    if attempt + 1 < self.max_attempts {
                        let backoff = self.backoff_base * 2u32.saturating_pow(attempt);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        tracing::warn!(
            "Advisory failed after {} attempts, deferring to local fallback",
            self.max_attempts
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::Action;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Advisory stub that fails a fixed number of times before succeeding
    struct FlakyAdvisory {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AdvisoryService for FlakyAdvisory {
        async fn advise(&self, _prompt: &str) -> Result<Decision, AdvisoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AdvisoryError::EmptyResponse)
            } else {
                Ok(Decision::new(Action::Paginate, "stub"))
            }
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let advisory = RetryingAdvisory::new(
            FlakyAdvisory {
                failures: 2,
                calls: AtomicU32::new(0),
            },
            3,
            Duration::from_millis(1),
        );

        let decision = advisory.query("state").await;
        assert_eq!(decision.map(|d| d.action), Some(Action::Paginate));
    }

    #[tokio::test]
    async fn test_exhaustion_yields_default() {
        let advisory = RetryingAdvisory::new(
            FlakyAdvisory {
                failures: 10,
                calls: AtomicU32::new(0),
            },
            3,
            Duration::from_millis(1),
        );

        let decision = advisory.query("state").await;
        assert_eq!(decision, None);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = HttpAdvisoryClient::new("http://localhost:1", "test-model", None);
        let advisory = RetryingAdvisory::new(client, 3, Duration::from_secs(5));

        // Must return immediately, without backoff sleeps
        let decision = advisory.query("state").await;
        assert_eq!(decision, None);
    }
}
