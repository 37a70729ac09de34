use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ContextStore, StoreError};
use crate::models::chat::{ActiveUser, ChatMessage, ChatStats, LatestConversation};
use crate::models::context::{ContextRecord, UserContext};

#[derive(Default)]
struct Inner {
    contexts: HashMap<String, ContextRecord>,
    history: Vec<ChatMessage>,
    last_context_id: i64,
    last_message_id: i64,
}

/// In-process store behind a single lock: every write is serialized, so the
/// same last-write-wins and append-only rules as PostgreSQL hold.
#[derive(Default)]
pub struct MemoryContextStore {
    inner: RwLock<Inner>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn get_context(&self, user_id: &str) -> Result<ContextRecord, StoreError> {
        self.inner
            .read()
            .await
            .contexts
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::ContextNotFound(user_id.to_string()))
    }

    async fn upsert_context(
        &self,
        user_id: &str,
        context: &UserContext,
    ) -> Result<ContextRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        let existing = inner
            .contexts
            .get(user_id)
            .map(|r| (r.id, r.version, r.created_at));

        let record = match existing {
            Some((id, version, created_at)) => ContextRecord {
                id,
                user_id: user_id.to_string(),
                version: version + 1,
                context: context.clone(),
                created_at,
                updated_at: now,
            },
            None => {
                inner.last_context_id += 1;
                ContextRecord {
                    id: inner.last_context_id,
                    user_id: user_id.to_string(),
                    version: 1,
                    context: context.clone(),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        inner.contexts.insert(user_id.to_string(), record.clone());
        Ok(record)
    }

    async fn add_chat_message(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<ChatMessage, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.contexts.contains_key(user_id) {
            return Err(StoreError::ContextNotFound(user_id.to_string()));
        }

        inner.last_message_id += 1;
        let message = ChatMessage {
            id: inner.last_message_id,
            user_id: user_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        inner.history.push(message.clone());
        Ok(message)
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.contexts.contains_key(user_id) {
            return Err(StoreError::ContextNotFound(user_id.to_string()));
        }

        let mut messages: Vec<ChatMessage> = inner
            .history
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        // Appends happen under the write lock, so id order is insertion order.
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit as usize);
        Ok(messages)
    }

    async fn stats(&self) -> Result<ChatStats, StoreError> {
        let inner = self.inner.read().await;

        let mut per_user: HashMap<&str, i64> = HashMap::new();
        for message in &inner.history {
            *per_user.entry(message.user_id.as_str()).or_default() += 1;
        }

        let latest_conversation = inner
            .history
            .iter()
            .max_by_key(|m| m.id)
            .map(|m| LatestConversation {
                user_id: m.user_id.clone(),
                created_at: m.created_at,
            });

        // Highest count wins; ties go to the alphabetically first user.
        let most_active_user = per_user
            .iter()
            .max_by(|(a_user, a_count), (b_user, b_count)| {
                a_count.cmp(b_count).then_with(|| b_user.cmp(a_user))
            })
            .map(|(user_id, count)| ActiveUser {
                user_id: user_id.to_string(),
                message_count: *count,
            });

        Ok(ChatStats {
            total_conversations: inner.history.len() as i64,
            unique_users: per_user.len() as i64,
            latest_conversation,
            most_active_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::context::{Background, Constraints, LearningPreferences, Skill};

    fn context_with_skills(names: &[&str]) -> UserContext {
        UserContext {
            learning_preferences: LearningPreferences {
                preferred_learning_style: Some("visual".to_string()),
                time_availability: None,
            },
            constraints: Constraints::default(),
            background: Background::default(),
            skills: names
                .iter()
                .map(|name| Skill {
                    id: None,
                    name: name.to_string(),
                    category: None,
                    level: Some("intermediate".to_string()),
                    description: None,
                })
                .collect(),
            progresses: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_context_without_upsert_is_not_found() {
        let store = MemoryContextStore::new();
        assert!(matches!(
            store.get_context("u1").await,
            Err(StoreError::ContextNotFound(id)) if id == "u1"
        ));
    }

    #[tokio::test]
    async fn test_upsert_then_get_returns_same_payload() {
        let store = MemoryContextStore::new();
        let ctx = context_with_skills(&["python"]);

        store.upsert_context("u1", &ctx).await.unwrap();
        let record = store.get_context("u1").await.unwrap();

        assert_eq!(record.context, ctx);
        assert_eq!(record.context.skills.len(), 1);
        assert_eq!(record.context.skills[0].name, "python");
        assert_eq!(record.context.skills[0].level.as_deref(), Some("intermediate"));
    }

    #[tokio::test]
    async fn test_upsert_is_full_replace() {
        let store = MemoryContextStore::new();
        let first = store
            .upsert_context("u1", &context_with_skills(&["python", "javascript"]))
            .await
            .unwrap();
        let second = store
            .upsert_context("u1", &context_with_skills(&[]))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.version, 2);
        assert!(second.context.skills.is_empty());
    }

    #[tokio::test]
    async fn test_each_user_gets_its_own_id() {
        let store = MemoryContextStore::new();
        let a = store.upsert_context("a", &context_with_skills(&[])).await.unwrap();
        let b = store.upsert_context("b", &context_with_skills(&[])).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_chat_message_requires_context() {
        let store = MemoryContextStore::new();
        assert!(matches!(
            store.add_chat_message("ghost", "q", "a").await,
            Err(StoreError::ContextNotFound(_))
        ));
        assert!(matches!(
            store.get_history("ghost", 10).await,
            Err(StoreError::ContextNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let store = MemoryContextStore::new();
        store.upsert_context("u1", &context_with_skills(&[])).await.unwrap();
        store.upsert_context("u2", &context_with_skills(&[])).await.unwrap();
        for i in 0..5 {
            store
                .add_chat_message("u1", &format!("q{i}"), &format!("a{i}"))
                .await
                .unwrap();
        }
        store.add_chat_message("u2", "other", "other").await.unwrap();

        let all = store.get_history("u1", 50).await.unwrap();
        let questions: Vec<_> = all.iter().map(|m| m.question.as_str()).collect();
        assert_eq!(questions, vec!["q4", "q3", "q2", "q1", "q0"]);

        let limited = store.get_history("u1", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].question, "q4");
    }

    #[tokio::test]
    async fn test_history_order_ignores_clock_steps() {
        let store = MemoryContextStore::new();
        store.upsert_context("u1", &context_with_skills(&[])).await.unwrap();
        for q in ["q0", "q1", "q2"] {
            store.add_chat_message("u1", q, "a").await.unwrap();
        }
        {
            // Newest message stamped an hour before the others.
            let mut inner = store.inner.write().await;
            let earlier = inner.history[0].created_at - chrono::Duration::hours(1);
            inner.history[2].created_at = earlier;
        }

        let history = store.get_history("u1", 50).await.unwrap();
        let questions: Vec<_> = history.iter().map(|m| m.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q1", "q0"]);
        assert_eq!(
            store.stats().await.unwrap().latest_conversation.unwrap().created_at,
            history[0].created_at
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_neither_lost_nor_duplicated() {
        let store = Arc::new(MemoryContextStore::new());
        store.upsert_context("u1", &context_with_skills(&[])).await.unwrap();

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add_chat_message("u1", &format!("q{i}"), "a")
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let history = store.get_history("u1", 500).await.unwrap();
        assert_eq!(history.len(), 25);
        let mut ids: Vec<_> = history.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_resolve_to_one_whole_payload() {
        let store = Arc::new(MemoryContextStore::new());
        let payloads: Vec<UserContext> = (0..10)
            .map(|i| {
                context_with_skills(&[
                    format!("skill-{i}").as_str(),
                    format!("extra-{i}").as_str(),
                ])
            })
            .collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|ctx| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_context("u1", &ctx).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.get_context("u1").await.unwrap();
        assert_eq!(record.version, 10);
        assert!(payloads.contains(&record.context));
    }

    #[tokio::test]
    async fn test_stats() {
        let store = MemoryContextStore::new();
        let empty = store.stats().await.unwrap();
        assert_eq!(empty.total_conversations, 0);
        assert!(empty.latest_conversation.is_none());
        assert!(empty.most_active_user.is_none());

        store.upsert_context("alice", &context_with_skills(&[])).await.unwrap();
        store.upsert_context("bob", &context_with_skills(&[])).await.unwrap();
        store.add_chat_message("alice", "q", "a").await.unwrap();
        store.add_chat_message("bob", "q", "a").await.unwrap();
        store.add_chat_message("bob", "q", "a").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.latest_conversation.unwrap().user_id, "bob");
        assert_eq!(
            stats.most_active_user,
            Some(ActiveUser {
                user_id: "bob".to_string(),
                message_count: 2
            })
        );
    }
}
