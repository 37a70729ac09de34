//! Wire types shared by the chatbot and the context service.

pub mod chat;
pub mod context;

/// History endpoints return messages newest first.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 500;
