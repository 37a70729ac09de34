use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::{ContextStore, StoreError};
use crate::models::chat::{ActiveUser, ChatMessage, ChatStats, LatestConversation};
use crate::models::context::{
    Background, Constraints, ContextRecord, LearningPreferences, ProgressEntry, Skill,
    UserContext,
};

const CONTEXT_COLUMNS: &str = "id, user_id, version, learning_preferences, constraints, \
    background, skills, progresses, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ContextRow {
    id: i64,
    user_id: String,
    version: i32,
    learning_preferences: Json<LearningPreferences>,
    constraints: Json<Constraints>,
    background: Json<Background>,
    skills: Json<Vec<Skill>>,
    progresses: Json<Vec<ProgressEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContextRow> for ContextRecord {
    fn from(row: ContextRow) -> Self {
        ContextRecord {
            id: row.id,
            user_id: row.user_id,
            version: row.version,
            context: UserContext {
                learning_preferences: row.learning_preferences.0,
                constraints: row.constraints.0,
                background: row.background.0,
                skills: row.skills.0,
                progresses: row.progresses.0,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ChatMessageRow {
    id: i64,
    user_id: String,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        ChatMessage {
            id: row.id,
            user_id: row.user_id,
            question: row.question,
            answer: row.answer,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store. Connections come from the pool per call and are
/// returned when the query or transaction finishes.
#[derive(Clone)]
pub struct PgContextStore {
    pool: PgPool,
}

impl PgContextStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn context_exists(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contexts WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl ContextStore for PgContextStore {
    async fn get_context(&self, user_id: &str) -> Result<ContextRecord, StoreError> {
        let row: Option<ContextRow> = sqlx::query_as(&format!(
            "SELECT {CONTEXT_COLUMNS} FROM contexts WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContextRecord::from)
            .ok_or_else(|| StoreError::ContextNotFound(user_id.to_string()))
    }

    async fn upsert_context(
        &self,
        user_id: &str,
        context: &UserContext,
    ) -> Result<ContextRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row-level lock from ON CONFLICT serializes writers for the same
        // user; the last committed payload wins as a whole.
        let row: ContextRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO contexts
                (user_id, learning_preferences, constraints, background, skills, progresses)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                learning_preferences = EXCLUDED.learning_preferences,
                constraints = EXCLUDED.constraints,
                background = EXCLUDED.background,
                skills = EXCLUDED.skills,
                progresses = EXCLUDED.progresses,
                version = contexts.version + 1,
                updated_at = now()
            RETURNING {CONTEXT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(Json(&context.learning_preferences))
        .bind(Json(&context.constraints))
        .bind(Json(&context.background))
        .bind(Json(&context.skills))
        .bind(Json(&context.progresses))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Upserted context {} for user {user_id} (version {})", row.id, row.version);
        Ok(row.into())
    }

    async fn add_chat_message(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<ChatMessage, StoreError> {
        let result = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_history (user_id, question, answer)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, question, answer, created_at
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(StoreError::ContextNotFound(user_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        if !self.context_exists(user_id).await? {
            return Err(StoreError::ContextNotFound(user_id.to_string()));
        }

        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, user_id, question, answer, created_at
            FROM chat_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn stats(&self) -> Result<ChatStats, StoreError> {
        let (total_conversations, unique_users): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(DISTINCT user_id) FROM chat_history")
                .fetch_one(&self.pool)
                .await?;

        let latest: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT user_id, created_at FROM chat_history ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let most_active: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, COUNT(*) AS message_count
            FROM chat_history
            GROUP BY user_id
            ORDER BY message_count DESC, user_id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(ChatStats {
            total_conversations,
            unique_users,
            latest_conversation: latest
                .map(|(user_id, created_at)| LatestConversation { user_id, created_at }),
            most_active_user: most_active
                .map(|(user_id, message_count)| ActiveUser { user_id, message_count }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn context_with_skill(name: &str) -> UserContext {
        UserContext {
            learning_preferences: LearningPreferences::default(),
            constraints: Constraints::default(),
            background: Background::default(),
            skills: vec![Skill {
                id: None,
                name: name.to_string(),
                category: None,
                level: Some("intermediate".to_string()),
                description: None,
            }],
            progresses: vec![],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_upsert_then_get_round_trips(pool: PgPool) {
        let store = PgContextStore::new(pool);
        let ctx = context_with_skill("python");

        let written = store.upsert_context("u1", &ctx).await.unwrap();
        let read = store.get_context("u1").await.unwrap();

        assert_eq!(read.context, ctx);
        assert_eq!(read.id, written.id);
        assert_eq!(read.version, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_second_upsert_replaces_and_keeps_id(pool: PgPool) {
        let store = PgContextStore::new(pool);
        let first = store
            .upsert_context("u1", &context_with_skill("python"))
            .await
            .unwrap();
        let second = store
            .upsert_context("u1", &context_with_skill("rust"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.version, 2);
        assert_eq!(second.context.skills.len(), 1);
        assert_eq!(second.context.skills[0].name, "rust");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_missing_context_is_not_found(pool: PgPool) {
        let store = PgContextStore::new(pool);
        assert!(matches!(
            store.get_context("nobody").await,
            Err(StoreError::ContextNotFound(_))
        ));
        assert!(matches!(
            store.add_chat_message("nobody", "q", "a").await,
            Err(StoreError::ContextNotFound(_))
        ));
        assert!(matches!(
            store.get_history("nobody", 10).await,
            Err(StoreError::ContextNotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_history_is_newest_first(pool: PgPool) {
        let store = PgContextStore::new(pool);
        store
            .upsert_context("u1", &context_with_skill("python"))
            .await
            .unwrap();
        for i in 0..3 {
            store
                .add_chat_message("u1", &format!("q{i}"), &format!("a{i}"))
                .await
                .unwrap();
        }

        let history = store.get_history("u1", 50).await.unwrap();
        let questions: Vec<_> = history.iter().map(|m| m.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q1", "q0"]);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.unique_users, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_concurrent_upserts_resolve_last_write_wins(pool: PgPool) {
        let store = Arc::new(PgContextStore::new(pool));
        let payloads: Vec<UserContext> = (0..10)
            .map(|i| context_with_skill(&format!("skill-{i}")))
            .collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|ctx| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_context("u1", &ctx).await.unwrap() })
            })
            .collect();
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }

        let record = store.get_context("u1").await.unwrap();
        assert_eq!(record.version, 10);
        assert!(ids.iter().all(|id| *id == record.id));
        assert!(payloads.contains(&record.context));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_concurrent_appends_are_neither_lost_nor_duplicated(pool: PgPool) {
        let store = Arc::new(PgContextStore::new(pool));
        store
            .upsert_context("u1", &context_with_skill("python"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..20)
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
        assert_eq!(history.len(), 20);
        let mut questions: Vec<_> = history.iter().map(|m| m.question.clone()).collect();
        questions.sort();
        questions.dedup();
        assert_eq!(questions.len(), 20);
    }
}
