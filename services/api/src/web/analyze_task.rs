//! services/api/src/web/analyze_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! handling a single analysis request from guard to persistence.

use litmaster_core::domain::{AnalysisResult, ChatMessage, TextType};
use litmaster_core::ports::{PortError, StoreService, TextAnalysisService};
use tracing::info;
use uuid::Uuid;

/// Why an analysis request produced no result.
#[derive(Debug)]
pub enum AnalyzeError {
    /// The input was empty or whitespace-only; no endpoint call was made.
    EmptyInput,
    /// The endpoint call or the store failed.
    Port(PortError),
}

impl From<PortError> for AnalyzeError {
    fn from(e: PortError) -> Self {
        AnalyzeError::Port(e)
    }
}

/// The tutor's opening message attached to every fresh analysis.
pub fn greeting_for(text_type: TextType) -> String {
    format!(
        "你好！我是你的语文助教壮壮。我已经分析了这篇{}。你可以问我关于文中具体字词的含义、写作手法或主旨的问题。",
        text_type.chinese_name()
    )
}

/// The main asynchronous task for handling one analysis request.
///
/// Runs the caller-side guard first, so empty input never reaches the
/// generation endpoint. Nothing is persisted unless the whole call chain
/// succeeds; a failed analysis leaves the history untouched.
pub async fn run_analysis(
    analyzer: &dyn TextAnalysisService,
    store: &dyn StoreService,
    user_id: Uuid,
    text: &str,
    text_type: TextType,
) -> Result<AnalysisResult, AnalyzeError> {
    if text.trim().is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }

    let payload = analyzer.analyze_text(text, text_type).await?;

    let mut result = AnalysisResult::from_payload(payload, text_type, text);
    result
        .chat_history
        .push(ChatMessage::model(greeting_for(text_type)));

    store.save_analysis(user_id, &result).await?;
    info!(analysis_id = %result.id, text_type = text_type.as_tag(), "Analysis stored");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{MockAnalyzer, MockStore};
    use litmaster_core::domain::ChatRole;

    #[tokio::test]
    async fn successful_analysis_is_stamped_and_stored() {
        let analyzer = MockAnalyzer::succeeding();
        let store = MockStore::default();
        let user_id = Uuid::new_v4();

        let result = run_analysis(&analyzer, &store, user_id, "春眠不觉晓", TextType::Poetry)
            .await
            .unwrap();

        assert_eq!(result.text_type, TextType::Poetry);
        assert_eq!(result.original_text, "春眠不觉晓");
        assert!(!result.summary.is_empty());

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0], result);
    }

    #[tokio::test]
    async fn greeting_is_the_first_transcript_message() {
        let analyzer = MockAnalyzer::succeeding();
        let store = MockStore::default();

        let result = run_analysis(&analyzer, &store, Uuid::new_v4(), "某篇小说", TextType::Novel)
            .await
            .unwrap();

        assert_eq!(result.chat_history.len(), 1);
        let greeting = &result.chat_history[0];
        assert_eq!(greeting.role, ChatRole::Model);
        assert!(greeting.text.contains("小说"));
        assert!(greeting.text.contains("壮壮"));
    }

    #[tokio::test]
    async fn whitespace_input_never_reaches_the_endpoint() {
        let analyzer = MockAnalyzer::succeeding();
        let store = MockStore::default();

        let err = run_analysis(&analyzer, &store, Uuid::new_v4(), "   \n\t", TextType::Prose)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::EmptyInput));
        assert_eq!(analyzer.call_count(), 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn endpoint_failure_leaves_history_unchanged() {
        let analyzer = MockAnalyzer::failing();
        let store = MockStore::default();

        let err = run_analysis(&analyzer, &store, Uuid::new_v4(), "春眠不觉晓", TextType::Poetry)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::Port(_)));
        assert_eq!(analyzer.call_count(), 1);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn fresh_ids_are_unique_across_results() {
        // Stamping twice from identical payloads must never collide.
        let a = AnalysisResult::from_payload(
            crate::web::testing::sample_payload(),
            TextType::Prose,
            "文",
        );
        let b = AnalysisResult::from_payload(
            crate::web::testing::sample_payload(),
            TextType::Prose,
            "文",
        );
        assert_ne!(a.id, b.id);
    }
}
