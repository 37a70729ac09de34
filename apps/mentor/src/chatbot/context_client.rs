//! HTTP client for the Context Service.
//!
//! Every call is a single request bounded by the configured timeout.
//! Error envelopes returned by the service are decoded so callers can tell
//! a missing user apart from a failed write.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::models::context::{ContextRecord, StatusResponse};

#[derive(Debug, Error)]
pub enum ContextClientError {
    #[error("invalid context service URL: {0}")]
    InvalidUrl(String),

    #[error("context service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("context service timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    NotFound(String),

    #[error("context service returned {status} ({code}): {message}")]
    Upstream {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected response from context service: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

impl ContextClientError {
    /// True when the service accepted the request but failed to store it.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, ContextClientError::Upstream { code, .. } if code == "PERSISTENCE_ERROR")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct ContextClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ContextClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContextClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ContextClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ContextClientError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ContextClientError::Unreachable)?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// GET /context/{user_id}
    pub async fn get_context(&self, user_id: &str) -> Result<ContextRecord, ContextClientError> {
        let response = self
            .client
            .get(self.endpoint(&["context", user_id]))
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.decode(response).await
    }

    /// GET /chat/{user_id}?limit=N, newest first.
    pub async fn get_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, ContextClientError> {
        let response = self
            .client
            .get(self.endpoint(&["chat", user_id]))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.decode(response).await
    }

    /// POST /chat/{user_id}
    pub async fn add_chat_message(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), ContextClientError> {
        let body = NewChatMessage {
            user_id: user_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
        };
        let response = self
            .client
            .post(self.endpoint(&["chat", user_id]))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let _: StatusResponse = self.decode(response).await?;
        Ok(())
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn classify(&self, e: reqwest::Error) -> ContextClientError {
        if e.is_timeout() {
            ContextClientError::Timeout(self.timeout)
        } else {
            ContextClientError::Unreachable(e)
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ContextClientError> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    ContextClientError::Timeout(self.timeout)
                } else {
                    ContextClientError::InvalidResponse(e)
                }
            });
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => ("UNKNOWN".to_string(), body),
        };

        if status == StatusCode::NOT_FOUND {
            return Err(ContextClientError::NotFound(message));
        }
        Err(ContextClientError::Upstream {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
