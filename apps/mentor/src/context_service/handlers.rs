use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::context_service::errors::{AppError, AppJson, AppQuery};
use crate::context_service::state::AppState;
use crate::context_service::validation::{
    validate_chat_message, validate_upsert, validate_user_id,
};
use crate::models::chat::{ChatMessage, ChatStats, NewChatMessage};
use crate::models::context::{ContextRecord, ContextUpsertRequest, StatusResponse};
use crate::models::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

impl HistoryQuery {
    fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "context-service"
    }))
}

/// GET /context/:user_id
pub async fn handle_get_context(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ContextRecord>, AppError> {
    validate_user_id(&user_id).map_err(AppError::Validation)?;
    let record = state.store.get_context(&user_id).await?;
    Ok(Json(record))
}

/// POST /context/:user_id
///
/// Creates the context on first call and fully replaces it afterwards.
pub async fn handle_upsert_context(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(request): AppJson<ContextUpsertRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    validate_upsert(&user_id, &request).map_err(AppError::Validation)?;

    let record = state.store.upsert_context(&user_id, &request.context).await?;
    info!(
        "Stored context {} for user {user_id} (version {}, {} skills, {} progress entries)",
        record.id,
        record.version,
        record.context.skills.len(),
        record.context.progresses.len()
    );

    Ok(Json(StatusResponse::success("Context updated successfully")))
}

/// POST /chat/:user_id
pub async fn handle_add_chat_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(message): AppJson<NewChatMessage>,
) -> Result<Json<StatusResponse>, AppError> {
    validate_chat_message(&user_id, &message).map_err(AppError::Validation)?;

    let stored = state
        .store
        .add_chat_message(&user_id, &message.question, &message.answer)
        .await?;
    info!("Stored chat message {} for user {user_id}", stored.id);

    Ok(Json(StatusResponse::success("Chat message saved successfully")))
}

/// GET /chat/:user_id?limit=N
///
/// Newest first.
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    validate_user_id(&user_id).map_err(AppError::Validation)?;
    let history = state
        .store
        .get_history(&user_id, query.effective_limit())
        .await?;
    Ok(Json(history))
}

/// GET /stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<ChatStats>, AppError> {
    Ok(Json(state.store.stats().await?))
}
