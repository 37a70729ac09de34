use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::chatbot::errors::{AppError, AppJson, AppQuery};
use crate::chatbot::orchestrator;
use crate::chatbot::state::AppState;
use crate::chatbot::validation::{validate_ask, validate_user_id};
use crate::models::chat::ChatMessage;
use crate::models::context::ContextRecord;
use crate::models::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// Stored context with its recent history attached.
#[derive(Debug, Serialize)]
pub struct ContextView {
    #[serde(flatten)]
    pub record: ContextRecord,
    pub history: Vec<ChatMessage>,
}

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "chatbot"
    }))
}

/// POST /ask
pub async fn handle_ask(
    State(state): State<AppState>,
    AppJson(request): AppJson<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    validate_ask(&request.user_id, &request.question).map_err(AppError::Validation)?;
    info!("Question received from user {}", request.user_id);

    let answer = orchestrator::ask(&state, &request.user_id, request.question.trim()).await?;
    Ok(Json(AskResponse { answer }))
}

/// GET /history/:user_id?limit=N
///
/// Newest first.
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    validate_user_id(&user_id).map_err(AppError::Validation)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let history = state.context.get_history(&user_id, limit).await?;
    Ok(Json(history))
}

/// GET /context/:user_id
pub async fn handle_get_context(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ContextView>, AppError> {
    validate_user_id(&user_id).map_err(AppError::Validation)?;
    let (record, history) = orchestrator::load(&state, &user_id, DEFAULT_HISTORY_LIMIT).await?;
    Ok(Json(ContextView { record, history }))
}
