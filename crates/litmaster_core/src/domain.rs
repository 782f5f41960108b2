//! crates/litmaster_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry their JSON wire shape (camelCase, as stored in user
//! histories and returned by the generation endpoint) but are otherwise
//! independent of any database or transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The literary category selected for an analysis. Controls prompt phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextType {
    Prose,
    Poetry,
    Novel,
}

impl TextType {
    /// The uppercase tag used on the wire and in prompts.
    pub fn as_tag(&self) -> &'static str {
        match self {
            TextType::Prose => "PROSE",
            TextType::Poetry => "POETRY",
            TextType::Novel => "NOVEL",
        }
    }

    /// Parses the uppercase wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PROSE" => Some(TextType::Prose),
            "POETRY" => Some(TextType::Poetry),
            "NOVEL" => Some(TextType::Novel),
            _ => None,
        }
    }

    /// The Chinese genre name used in tutor-facing text.
    pub fn chinese_name(&self) -> &'static str {
        match self {
            TextType::Prose => "散文",
            TextType::Poetry => "诗歌",
            TextType::Novel => "小说",
        }
    }
}

/// One identified rhetorical/literary device with a supporting example
/// and its effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    pub example: String,
    pub effect: String,
}

/// One exam-style question with a model answer and explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Free-text category label, e.g. "Language", "Theme", "Character".
    #[serde(rename = "type")]
    pub question_type: String,
    pub standard_answer: String,
    pub analysis: String,
}

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(ChatRole::User),
            "model" => Some(ChatRole::Model),
            _ => None,
        }
    }
}

/// A single turn in a tutor conversation. Append-only; ordering is
/// conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The un-stamped output of one analysis call: everything the generation
/// endpoint produces, before the caller attaches identity and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub title: String,
    pub summary: String,
    pub structure: Vec<String>,
    pub themes: Vec<String>,
    pub techniques: Vec<Technique>,
    pub generated_questions: Vec<Question>,
}

/// The structured literary breakdown returned for one submitted text.
///
/// Created once per successful analysis call; mutated only by appending to
/// its chat transcript as the tutor conversation progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub text_type: TextType,
    /// Step-by-step outline of the text flow.
    pub structure: Vec<String>,
    /// Key themes or emotions.
    pub themes: Vec<String>,
    pub techniques: Vec<Technique>,
    pub generated_questions: Vec<Question>,
    pub timestamp: DateTime<Utc>,
    pub original_text: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

impl AnalysisResult {
    /// Stamps a fresh result from a generation payload: new UUID, current
    /// timestamp, the requested text type, and the input text verbatim.
    pub fn from_payload(
        payload: AnalysisPayload,
        text_type: TextType,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: payload.title,
            summary: payload.summary,
            text_type,
            structure: payload.structure,
            themes: payload.themes,
            techniques: payload.techniques,
            generated_questions: payload.generated_questions,
            timestamp: Utc::now(),
            original_text: original_text.into(),
            chat_history: Vec::new(),
        }
    }
}

/// Represents a user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub role: UserRole,
}

/// Account role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(UserRole::Student),
            "teacher" => Some(UserRole::Teacher),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Student
    }
}

/// Derives the avatar URL shown next to a user from their username.
/// Same username, same avatar.
pub fn avatar_url_for(username: &str) -> String {
    format!("https://api.dicebear.com/7.x/notionists/svg?seed={username}")
}

// Only used internally for signup/login - contains the password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Per-user analysis counts for the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: u64,
    pub prose: u64,
    pub poetry: u64,
    pub novel: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(text_type: TextType) -> AnalysisResult {
        let payload = AnalysisPayload {
            title: "静夜思".to_string(),
            summary: "思乡之作".to_string(),
            structure: vec!["起：月光入户".to_string(), "承：疑是秋霜".to_string()],
            themes: vec!["思乡".to_string()],
            techniques: vec![Technique {
                name: "比喻".to_string(),
                example: "疑是地上霜".to_string(),
                effect: "以霜喻月光，渲染清冷".to_string(),
            }],
            generated_questions: vec![Question {
                id: "q1".to_string(),
                question: "诗人为何\"疑是地上霜\"？".to_string(),
                question_type: "Language".to_string(),
                standard_answer: "运用了比喻的手法……".to_string(),
                analysis: "考查修辞手法辨析".to_string(),
            }],
        };
        AnalysisResult::from_payload(payload, text_type, "床前明月光")
    }

    #[test]
    fn stamping_preserves_input_and_tag() {
        let result = sample_result(TextType::Poetry);
        assert_eq!(result.text_type, TextType::Poetry);
        assert_eq!(result.original_text, "床前明月光");
        assert!(result.chat_history.is_empty());
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = sample_result(TextType::Prose);
        let b = sample_result(TextType::Prose);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn text_type_uses_uppercase_tags() {
        assert_eq!(
            serde_json::to_string(&TextType::Poetry).unwrap(),
            "\"POETRY\""
        );
        let parsed: TextType = serde_json::from_str("\"NOVEL\"").unwrap();
        assert_eq!(parsed, TextType::Novel);
    }

    #[test]
    fn result_serializes_with_camel_case_fields() {
        let result = sample_result(TextType::Novel);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["textType"], "NOVEL");
        assert!(json.get("originalText").is_some());
        assert!(json.get("generatedQuestions").is_some());
        assert!(json.get("chatHistory").is_some());
        assert!(json["generatedQuestions"][0].get("standardAnswer").is_some());
        assert_eq!(json["generatedQuestions"][0]["type"], "Language");
    }

    #[test]
    fn history_round_trips_through_json() {
        let mut first = sample_result(TextType::Poetry);
        first.chat_history.push(ChatMessage::model("你好！"));
        first.chat_history.push(ChatMessage::user("这首诗的主旨是什么？"));
        let history = vec![first, sample_result(TextType::Prose)];

        let json = serde_json::to_string(&history).unwrap();
        let restored: Vec<AnalysisResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn avatar_is_deterministic_in_username() {
        assert_eq!(avatar_url_for("xiaoming"), avatar_url_for("xiaoming"));
        assert_ne!(avatar_url_for("xiaoming"), avatar_url_for("xiaohong"));
        assert!(avatar_url_for("xiaoming").ends_with("seed=xiaoming"));
    }
}
