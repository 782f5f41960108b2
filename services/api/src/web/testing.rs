//! services/api/src/web/testing.rs
//!
//! Hand-written mock port implementations shared by the web-layer tests.

use async_trait::async_trait;
use litmaster_core::domain::{
    AnalysisPayload, AnalysisResult, AnalysisStats, AuthSession, ChatMessage, Question, Technique,
    TextType, User, UserCredentials, UserRole,
};
use litmaster_core::ports::{
    PortError, PortResult, StoreService, TextAnalysisService, TutorChatService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// An in-memory store recording saved analyses and appended messages.
/// User/auth methods are not exercised by these tests and simply fail.
#[derive(Default)]
pub struct MockStore {
    pub saved: Mutex<Vec<AnalysisResult>>,
    pub appended: Mutex<Vec<(Uuid, ChatMessage)>>,
}

#[async_trait]
impl StoreService for MockStore {
    async fn create_user(
        &self,
        _username: &str,
        _hashed_password: &str,
        _avatar: &str,
        _role: UserRole,
    ) -> PortResult<User> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn get_user_by_id(&self, _user_id: Uuid) -> PortResult<User> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn get_credentials_by_username(&self, _username: &str) -> PortResult<UserCredentials> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn create_auth_session(&self, _session: &AuthSession) -> PortResult<()> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Err(PortError::Unexpected("not used in this test".to_string()))
    }

    async fn save_analysis(&self, _user_id: Uuid, analysis: &AnalysisResult) -> PortResult<()> {
        self.saved.lock().unwrap().push(analysis.clone());
        Ok(())
    }

    async fn get_analysis_by_id(
        &self,
        _user_id: Uuid,
        analysis_id: Uuid,
    ) -> PortResult<AnalysisResult> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == analysis_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Analysis {} not found", analysis_id)))
    }

    async fn list_analyses_for_user(&self, _user_id: Uuid) -> PortResult<Vec<AnalysisResult>> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn get_stats_for_user(&self, _user_id: Uuid) -> PortResult<AnalysisStats> {
        Ok(AnalysisStats::default())
    }

    async fn append_chat_message(
        &self,
        analysis_id: Uuid,
        message: &ChatMessage,
    ) -> PortResult<()> {
        self.appended
            .lock()
            .unwrap()
            .push((analysis_id, message.clone()));
        Ok(())
    }
}

/// A canned analysis payload in the shape a well-behaved provider returns.
pub fn sample_payload() -> AnalysisPayload {
    AnalysisPayload {
        title: "春晓".to_string(),
        summary: "惜春之情".to_string(),
        structure: vec!["起".to_string(), "承".to_string()],
        themes: vec!["惜春".to_string()],
        techniques: vec![Technique {
            name: "以声衬静".to_string(),
            example: "处处闻啼鸟".to_string(),
            effect: "烘托静谧".to_string(),
        }],
        generated_questions: vec![Question {
            id: "q1".to_string(),
            question: "运用了什么手法？".to_string(),
            question_type: "Language".to_string(),
            standard_answer: "……".to_string(),
            analysis: "……".to_string(),
        }],
    }
}

/// A one-shot analyzer that either returns the canned payload or fails,
/// counting how many times it was invoked.
pub struct MockAnalyzer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextAnalysisService for MockAnalyzer {
    async fn analyze_text(
        &self,
        _text: &str,
        _text_type: TextType,
    ) -> PortResult<AnalysisPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PortError::Unexpected("endpoint unreachable".to_string()))
        } else {
            Ok(sample_payload())
        }
    }
}

/// A tutor that either echoes a fixed reply or fails, recording what it was
/// asked.
pub struct MockTutor {
    pub fail: bool,
    pub reply: String,
    pub seen: Mutex<Vec<(usize, String, String)>>,
}

impl MockTutor {
    pub fn replying(reply: &str) -> Self {
        Self {
            fail: false,
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            reply: String::new(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TutorChatService for MockTutor {
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context_text: &str,
    ) -> PortResult<String> {
        self.seen.lock().unwrap().push((
            history.len(),
            new_message.to_string(),
            context_text.to_string(),
        ));
        if self.fail {
            Err(PortError::Unexpected("endpoint unreachable".to_string()))
        } else {
            Ok(self.reply.clone())
        }
    }
}
