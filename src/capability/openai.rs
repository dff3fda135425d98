//! Completion client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::capability::{CapabilityError, CompletionService};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

pub struct OpenAiCompletion {
    config: CompletionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(config: CompletionConfig) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CapabilityError::Completion(format!("http client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    pub fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        })
    }

    /// Pause before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(1 << attempt.min(6)))
    }

    fn map_error(&self, err: reqwest::Error) -> CapabilityError {
        map_reqwest_error(err, self.config.timeout)
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, CapabilityError> {
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Http {
                status: status.as_u16(),
                message: truncate_message(&message),
            });
        }
        let body: ChatCompletionResponse = response.json().await.map_err(|e| self.map_error(e))?;
        extract_reply(body)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
        let mut attempt = 0u32;
        loop {
            match self.complete_once(prompt).await {
                Ok(reply) => {
                    debug!(attempt, chars = reply.len(), "completion received");
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "completion failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // Every attempt runs under the client timeout, so the caller's limit has
    // to cover all attempts and the pauses between them.
    fn call_budget(&self, request_timeout: Duration) -> Duration {
        let attempts = self.config.max_retries.saturating_add(1);
        let pauses: Duration = (0..self.config.max_retries).map(|a| self.backoff(a)).sum();
        request_timeout.max(self.config.timeout.saturating_mul(attempts) + pauses)
    }
}

fn extract_reply(body: ChatCompletionResponse) -> Result<String, CapabilityError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CapabilityError::Completion("response contained no message".to_string()))
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> CapabilityError {
    if err.is_timeout() {
        CapabilityError::Timeout {
            operation: "completion request",
            secs: timeout.as_secs(),
        }
    } else if err.is_decode() {
        CapabilityError::Http {
            status: 200,
            message: format!("undecodable response: {err}"),
        }
    } else {
        CapabilityError::Completion(err.to_string())
    }
}

fn truncate_message(message: &str) -> String {
    message.chars().take(300).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/capability/openai.rs"]
mod tests;
