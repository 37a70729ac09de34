use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chatbot::context_client::ContextClientError;
use crate::chatbot::llm_client::LlmError;

/// Chatbot service error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Context service error: {0}")]
    Upstream(ContextClientError),

    #[error("Chat history write failed: {0}")]
    Persistence(ContextClientError),

    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("LLM timeout: {0}")]
    LlmTimeout(LlmError),
}

impl From<ContextClientError> for AppError {
    fn from(e: ContextClientError) -> Self {
        match e {
            ContextClientError::NotFound(msg) => AppError::NotFound(msg),
            e if e.is_persistence_failure() => AppError::Persistence(e),
            e => AppError::Upstream(e),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout(_) => AppError::LlmTimeout(e),
            e => AppError::Llm(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Upstream(e) => {
                tracing::warn!("Context service error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "The context service is unavailable".to_string(),
                )
            }
            AppError::Persistence(e) => {
                tracing::error!("Failed to persist chat message: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PERSISTENCE_FAILED",
                    "The answer could not be saved to chat history".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The language model failed to produce an answer".to_string(),
                )
            }
            AppError::LlmTimeout(e) => {
                tracing::warn!("{e}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "LLM_TIMEOUT",
                    "The language model did not answer in time".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// `Json` extractor whose rejections use the `AppError` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` extractor whose rejections use the `AppError` envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
