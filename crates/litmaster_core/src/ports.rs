//! crates/litmaster_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! generation APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AnalysisPayload, AnalysisResult, AnalysisStats, AuthSession, ChatMessage, TextType, User,
    UserCredentials, UserRole,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistent store for users, sessions, and analysis histories.
#[async_trait]
pub trait StoreService: Send + Sync {
    // --- User Management ---
    async fn create_user(
        &self,
        username: &str,
        hashed_password: &str,
        avatar: &str,
        role: UserRole,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Analysis Histories ---
    async fn save_analysis(&self, user_id: Uuid, analysis: &AnalysisResult) -> PortResult<()>;

    /// Returns one stored analysis, transcript included, exactly as persisted.
    async fn get_analysis_by_id(&self, user_id: Uuid, analysis_id: Uuid)
        -> PortResult<AnalysisResult>;

    /// Returns the user's full history, newest first.
    async fn list_analyses_for_user(&self, user_id: Uuid) -> PortResult<Vec<AnalysisResult>>;

    async fn get_stats_for_user(&self, user_id: Uuid) -> PortResult<AnalysisStats>;

    // --- Tutor Transcripts ---
    async fn append_chat_message(
        &self,
        analysis_id: Uuid,
        message: &ChatMessage,
    ) -> PortResult<()>;
}

/// The one-shot literary analysis operation against the generation endpoint.
#[async_trait]
pub trait TextAnalysisService: Send + Sync {
    /// Analyzes a text under the methodology for the given type. Single
    /// attempt; any transport, empty-response, or parse failure collapses
    /// into one generic error.
    async fn analyze_text(&self, text: &str, text_type: TextType) -> PortResult<AnalysisPayload>;
}

/// The follow-up tutor conversation, grounded in a previously analyzed text.
#[async_trait]
pub trait TutorChatService: Send + Sync {
    /// Replays `history` in order, submits `new_message`, and returns the
    /// reply text. `context_text` is the original analyzed text, appended to
    /// the tutor's instructions as grounding context. The whole history is
    /// resent every turn; there is no truncation or length cap.
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context_text: &str,
    ) -> PortResult<String>;
}
