//! Storage backends for contexts and chat history.
//!
//! `AppState` holds an `Arc<dyn ContextStore>`, chosen at startup from
//! `CONTEXT_STORE`. Both backends share these rules:
//! - an upsert replaces the whole aggregate and bumps `version`; concurrent
//!   upserts for one user resolve last-write-wins, never a field-level mix
//! - chat messages are append-only and require an existing context
//! - history is returned newest first (`created_at DESC, id DESC`)

use async_trait::async_trait;
use thiserror::Error;

use crate::models::chat::{ChatMessage, ChatStats};
use crate::models::context::{ContextRecord, UserContext};

pub mod memory;
pub mod postgres;

pub use memory::MemoryContextStore;
pub use postgres::PgContextStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No context found for user '{0}'")]
    ContextNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn get_context(&self, user_id: &str) -> Result<ContextRecord, StoreError>;

    /// Creates the context on first call, replaces it afterwards.
    async fn upsert_context(
        &self,
        user_id: &str,
        context: &UserContext,
    ) -> Result<ContextRecord, StoreError>;

    async fn add_chat_message(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<ChatMessage, StoreError>;

    /// At most `limit` messages, newest first.
    async fn get_history(&self, user_id: &str, limit: u32)
        -> Result<Vec<ChatMessage>, StoreError>;

    async fn stats(&self) -> Result<ChatStats, StoreError>;
}
