//! The `/ask` flow: fetch context and history, call the LLM, persist the
//! exchange, return the answer.
//!
//! Steps run strictly in that order. Nothing is written unless the LLM
//! produced an answer, and the answer is only returned once the write has
//! been acknowledged.

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::chatbot::errors::AppError;
use crate::chatbot::prompts::build_messages;
use crate::chatbot::state::AppState;
use crate::models::chat::ChatMessage;
use crate::models::context::ContextRecord;

pub async fn ask(state: &AppState, user_id: &str, question: &str) -> Result<String, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("ask", %request_id, user_id);
    run_ask(state, user_id, question).instrument(span).await
}

async fn run_ask(state: &AppState, user_id: &str, question: &str) -> Result<String, AppError> {
    let (record, history) = load(state, user_id, state.config.history_prompt_limit).await?;
    debug!(
        "Loaded context version {} and {} past exchanges",
        record.version,
        history.len()
    );

    let messages = build_messages(&record, &history, question);
    let answer = state.llm.complete(&messages).await?;
    debug!("LLM answered with {} characters", answer.len());

    state
        .context
        .add_chat_message(user_id, question, &answer)
        .await?;
    info!("Answered and stored question for user {user_id}");

    Ok(answer)
}

/// Context plus the most recent `limit` exchanges, newest first.
///
/// Both requests run concurrently; a missing context fails the whole load.
pub async fn load(
    state: &AppState,
    user_id: &str,
    limit: u32,
) -> Result<(ContextRecord, Vec<ChatMessage>), AppError> {
    if limit == 0 {
        let record = state.context.get_context(user_id).await?;
        return Ok((record, Vec::new()));
    }
    let (record, history) = tokio::try_join!(
        state.context.get_context(user_id),
        state.context.get_history(user_id, limit),
    )?;
    Ok((record, history))
}
