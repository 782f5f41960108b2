//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use litmaster_core::domain::{
    AnalysisResult, AnalysisStats, ChatMessage, Question, Technique, TextType, User,
};
use litmaster_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::analyze_task::{run_analysis, AnalyzeError};
use crate::web::state::AppState;
use crate::web::tutor_task::run_tutor_turn;

/// The blocking notice shown when an analysis call fails, whatever the cause.
const ANALYSIS_FAILED_NOTICE: &str = "分析失败，请重试。";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        create_analysis_handler,
        list_analyses_handler,
        get_analysis_handler,
        chat_handler,
        profile_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            AnalyzeRequest,
            AnalysisResponse,
            AnalysisSummary,
            TechniqueDto,
            QuestionDto,
            ChatMessageDto,
            ChatRequest,
            ChatReplyResponse,
            ProfileResponse,
            StatsDto,
        )
    ),
    tags(
        (name = "Literary Analysis API", description = "API endpoints for the literary study coach.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The literary text to analyze, pasted verbatim.
    pub text: String,
    /// One of PROSE, POETRY, NOVEL.
    #[schema(value_type = String, example = "POETRY")]
    pub text_type: TextType,
}

#[derive(Serialize, ToSchema)]
pub struct TechniqueDto {
    pub name: String,
    pub example: String,
    pub effect: String,
}

impl From<Technique> for TechniqueDto {
    fn from(t: Technique) -> Self {
        Self {
            name: t.name,
            example: t.example,
            effect: t.effect,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub standard_answer: String,
    pub analysis: String,
}

impl From<Question> for QuestionDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question: q.question,
            question_type: q.question_type,
            standard_answer: q.standard_answer,
            analysis: q.analysis,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatMessageDto {
    /// "user" or "model".
    pub role: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageDto {
    fn from(m: ChatMessage) -> Self {
        Self {
            role: m.role.as_str().to_string(),
            text: m.text,
            timestamp: m.timestamp,
        }
    }
}

/// A full stored analysis, transcript included.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    #[schema(value_type = String, example = "POETRY")]
    pub text_type: TextType,
    pub structure: Vec<String>,
    pub themes: Vec<String>,
    pub techniques: Vec<TechniqueDto>,
    pub generated_questions: Vec<QuestionDto>,
    pub timestamp: DateTime<Utc>,
    pub original_text: String,
    pub chat_history: Vec<ChatMessageDto>,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(a: AnalysisResult) -> Self {
        Self {
            id: a.id,
            title: a.title,
            summary: a.summary,
            text_type: a.text_type,
            structure: a.structure,
            themes: a.themes,
            techniques: a.techniques.into_iter().map(Into::into).collect(),
            generated_questions: a.generated_questions.into_iter().map(Into::into).collect(),
            timestamp: a.timestamp,
            original_text: a.original_text,
            chat_history: a.chat_history.into_iter().map(Into::into).collect(),
        }
    }
}

/// One history-list entry.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    #[schema(value_type = String, example = "PROSE")]
    pub text_type: TextType,
    pub timestamp: DateTime<Utc>,
}

impl From<&AnalysisResult> for AnalysisSummary {
    fn from(a: &AnalysisResult) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            summary: a.summary.clone(),
            text_type: a.text_type,
            timestamp: a.timestamp,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatReplyResponse {
    pub reply: ChatMessageDto,
}

#[derive(Serialize, ToSchema)]
pub struct StatsDto {
    pub total: u64,
    pub prose: u64,
    pub poetry: u64,
    pub novel: u64,
}

impl From<AnalysisStats> for StatsDto {
    fn from(s: AnalysisStats) -> Self {
        Self {
            total: s.total,
            prose: s.prose,
            poetry: s.poetry,
            novel: s.novel,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub avatar: String,
    /// "student" or "teacher".
    pub role: String,
    pub stats: StatsDto,
}

impl ProfileResponse {
    fn new(user: User, stats: AnalysisStats) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            avatar: user.avatar,
            role: user.role.as_str().to_string(),
            stats: stats.into(),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Analyze a pasted text and store the result in the user's history.
#[utoipa::path(
    post,
    path = "/analyses",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Analysis created successfully", body = AnalysisResponse),
        (status = 400, description = "Empty input text"),
        (status = 502, description = "The generation endpoint failed")
    )
)]
pub async fn create_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = run_analysis(
        app_state.analyzer.as_ref(),
        app_state.store.as_ref(),
        user_id,
        &req.text,
        req.text_type,
    )
    .await
    .map_err(|e| match e {
        AnalyzeError::EmptyInput => (
            StatusCode::BAD_REQUEST,
            "Text must not be empty".to_string(),
        ),
        AnalyzeError::Port(e) => {
            error!("Analysis failed: {:?}", e);
            (StatusCode::BAD_GATEWAY, ANALYSIS_FAILED_NOTICE.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(AnalysisResponse::from(result))))
}

/// List the user's analysis history, newest first.
#[utoipa::path(
    get,
    path = "/analyses",
    responses(
        (status = 200, description = "The user's history", body = [AnalysisSummary]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_analyses_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let analyses = app_state
        .store
        .list_analyses_for_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to list analyses: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load history".to_string(),
            )
        })?;

    let summaries: Vec<AnalysisSummary> = analyses.iter().map(Into::into).collect();
    Ok(Json(summaries))
}

/// Re-render one stored analysis exactly as persisted.
#[utoipa::path(
    get,
    path = "/analyses/{id}",
    params(("id" = Uuid, Path, description = "The analysis to load")),
    responses(
        (status = 200, description = "The stored analysis", body = AnalysisResponse),
        (status = 404, description = "No such analysis for this user")
    )
)]
pub async fn get_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let analysis = fetch_owned_analysis(&app_state, user_id, id).await?;
    Ok(Json(AnalysisResponse::from(analysis)))
}

/// Ask the tutor a follow-up question about a stored analysis.
#[utoipa::path(
    post,
    path = "/analyses/{id}/chat",
    params(("id" = Uuid, Path, description = "The analysis under discussion")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The tutor's reply (or the fixed fallback)", body = ChatReplyResponse),
        (status = 400, description = "Empty message"),
        (status = 404, description = "No such analysis for this user")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Message must not be empty".to_string(),
        ));
    }

    let analysis = fetch_owned_analysis(&app_state, user_id, id).await?;

    let reply = run_tutor_turn(
        app_state.store.as_ref(),
        app_state.tutor.as_ref(),
        &analysis,
        &req.message,
    )
    .await
    .map_err(|e| {
        error!("Failed to record tutor turn: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to record the conversation".to_string(),
        )
    })?;

    Ok(Json(ChatReplyResponse {
        reply: reply.into(),
    }))
}

/// The user's profile: account info plus per-type analysis counts.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile and stats", body = ProfileResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = app_state.store.get_user_by_id(user_id).await.map_err(|e| {
        error!("Failed to load user: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load profile".to_string(),
        )
    })?;
    let stats = app_state
        .store
        .get_stats_for_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load stats: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load profile".to_string(),
            )
        })?;

    Ok(Json(ProfileResponse::new(user, stats)))
}

async fn fetch_owned_analysis(
    app_state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<AnalysisResult, (StatusCode, String)> {
    app_state
        .store
        .get_analysis_by_id(user_id, id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (StatusCode::NOT_FOUND, "Analysis not found".to_string()),
            other => {
                error!("Failed to load analysis: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load analysis".to_string(),
                )
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_request_parses_the_wire_shape() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"text":"春眠不觉晓","textType":"POETRY"}"#).unwrap();
        assert_eq!(req.text, "春眠不觉晓");
        assert_eq!(req.text_type, TextType::Poetry);
    }

    #[test]
    fn analyze_request_rejects_unknown_type_tags() {
        let err = serde_json::from_str::<AnalyzeRequest>(r#"{"text":"x","textType":"ESSAY"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn analysis_response_keeps_the_persisted_shape() {
        let mut analysis = AnalysisResult::from_payload(
            crate::web::testing::sample_payload(),
            TextType::Poetry,
            "春眠不觉晓",
        );
        analysis.chat_history.push(ChatMessage::model("你好！"));

        let json = serde_json::to_value(AnalysisResponse::from(analysis)).unwrap();
        assert_eq!(json["textType"], "POETRY");
        assert_eq!(json["originalText"], "春眠不觉晓");
        assert_eq!(json["chatHistory"][0]["role"], "model");
        assert_eq!(json["generatedQuestions"][0]["type"], "Language");
    }
}
