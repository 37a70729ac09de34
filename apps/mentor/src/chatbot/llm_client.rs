//! LLM Client: the single point of entry for all LLM provider calls.
//!
//! No other module may call the provider directly. Each call is made once
//! and bounded by the configured timeout.
//!
//! Model: gpt-3.5-turbo (hardcoded, do not make configurable to prevent drift)
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The model used for every completion.
pub const MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the conversation sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Wraps the provider's chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// Sends the conversation and returns the answer text.
    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String, LlmError> {
        let response = self.call(messages).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    /// Makes a raw call, returning the full response object.
    pub async fn call(&self, messages: &[ChatTurn]) -> Result<ChatCompletionResponse, LlmError> {
        let request_body = ChatCompletionRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| self.classify(e))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(completion)
    }

    fn classify(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(e)
        }
    }
}
