//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoreService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use litmaster_core::domain::{
    AnalysisResult, AnalysisStats, AuthSession, ChatMessage, ChatRole, Question, Technique,
    TextType, User, UserCredentials, UserRole,
};
use litmaster_core::ports::{PortError, PortResult, StoreService};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoreService` port.
#[derive(Clone)]
pub struct DbStore {
    pool: PgPool,
}

impl DbStore {
    /// Creates a new `DbStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn chat_messages_for(&self, analysis_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, ChatMessageRecord>(
            "SELECT role, text, created_at FROM chat_messages WHERE analysis_id = $1 ORDER BY seq ASC",
        )
        .bind(analysis_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    avatar: String,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = UserRole::from_str(&self.role)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown user role '{}'", self.role)))?;
        Ok(User {
            id: self.id,
            username: self.username,
            avatar: self.avatar,
            role,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    username: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AnalysisRecord {
    id: Uuid,
    title: String,
    summary: String,
    text_type: String,
    structure: Json<Vec<String>>,
    themes: Json<Vec<String>>,
    techniques: Json<Vec<Technique>>,
    generated_questions: Json<Vec<Question>>,
    original_text: String,
    created_at: DateTime<Utc>,
}
impl AnalysisRecord {
    fn to_domain(self, chat_history: Vec<ChatMessage>) -> PortResult<AnalysisResult> {
        let text_type = TextType::from_tag(&self.text_type).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown text type '{}'", self.text_type))
        })?;
        Ok(AnalysisResult {
            id: self.id,
            title: self.title,
            summary: self.summary,
            text_type,
            structure: self.structure.0,
            themes: self.themes.0,
            techniques: self.techniques.0,
            generated_questions: self.generated_questions.0,
            timestamp: self.created_at,
            original_text: self.original_text,
            chat_history,
        })
    }
}

#[derive(FromRow)]
struct ChatMessageRecord {
    role: String,
    text: String,
    created_at: DateTime<Utc>,
}
impl ChatMessageRecord {
    fn to_domain(self) -> PortResult<ChatMessage> {
        let role = ChatRole::from_str(&self.role)
            .ok_or_else(|| PortError::Unexpected(format!("Unknown chat role '{}'", self.role)))?;
        Ok(ChatMessage {
            role,
            text: self.text,
            timestamp: self.created_at,
        })
    }
}

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for DbStore {
    async fn create_user(
        &self,
        username: &str,
        hashed_password: &str,
        avatar: &str,
        role: UserRole,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, hashed_password, avatar, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id, username, avatar, role",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(hashed_password)
        .bind(avatar)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, avatar, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User '{}' not found", username))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Uuid = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn save_analysis(&self, user_id: Uuid, analysis: &AnalysisResult) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO analyses \
             (id, user_id, title, summary, text_type, structure, themes, techniques, generated_questions, original_text, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(analysis.id)
        .bind(user_id)
        .bind(&analysis.title)
        .bind(&analysis.summary)
        .bind(analysis.text_type.as_tag())
        .bind(Json(&analysis.structure))
        .bind(Json(&analysis.themes))
        .bind(Json(&analysis.techniques))
        .bind(Json(&analysis.generated_questions))
        .bind(&analysis.original_text)
        .bind(analysis.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for message in &analysis.chat_history {
            self.append_chat_message(analysis.id, message).await?;
        }
        Ok(())
    }

    async fn get_analysis_by_id(
        &self,
        user_id: Uuid,
        analysis_id: Uuid,
    ) -> PortResult<AnalysisResult> {
        let record = sqlx::query_as::<_, AnalysisRecord>(
            "SELECT id, title, summary, text_type, structure, themes, techniques, generated_questions, original_text, created_at \
             FROM analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(analysis_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Analysis {} not found", analysis_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        let chat_history = self.chat_messages_for(analysis_id).await?;
        record.to_domain(chat_history)
    }

    async fn list_analyses_for_user(&self, user_id: Uuid) -> PortResult<Vec<AnalysisResult>> {
        let records = sqlx::query_as::<_, AnalysisRecord>(
            "SELECT id, title, summary, text_type, structure, themes, techniques, generated_questions, original_text, created_at \
             FROM analyses WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut analyses = Vec::with_capacity(records.len());
        for record in records {
            let chat_history = self.chat_messages_for(record.id).await?;
            analyses.push(record.to_domain(chat_history)?);
        }
        Ok(analyses)
    }

    async fn get_stats_for_user(&self, user_id: Uuid) -> PortResult<AnalysisStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT text_type, COUNT(*) FROM analyses WHERE user_id = $1 GROUP BY text_type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut stats = AnalysisStats::default();
        for (text_type, count) in rows {
            let count = count as u64;
            stats.total += count;
            match TextType::from_tag(&text_type) {
                Some(TextType::Prose) => stats.prose += count,
                Some(TextType::Poetry) => stats.poetry += count,
                Some(TextType::Novel) => stats.novel += count,
                None => {
                    return Err(PortError::Unexpected(format!(
                        "Unknown text type '{}' in stats",
                        text_type
                    )))
                }
            }
        }
        Ok(stats)
    }

    async fn append_chat_message(
        &self,
        analysis_id: Uuid,
        message: &ChatMessage,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (analysis_id, role, text, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(analysis_id)
        .bind(message.role.as_str())
        .bind(&message.text)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
