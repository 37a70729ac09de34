use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted question/answer exchange. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /chat/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub user_id: String,
    pub question: String,
    pub answer: String,
}

/// Aggregate numbers over the whole chat history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStats {
    pub total_conversations: i64,
    pub unique_users: i64,
    pub latest_conversation: Option<LatestConversation>,
    pub most_active_user: Option<ActiveUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestConversation {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub user_id: String,
    pub message_count: i64,
}
