//! services/api/src/web/tutor_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! handling a single tutor-chat turn.

use litmaster_core::domain::{AnalysisResult, ChatMessage};
use litmaster_core::ports::{PortResult, StoreService, TutorChatService};
use tracing::warn;

/// Substituted into the transcript when the tutor call fails, so the
/// conversation keeps its shape instead of losing the turn.
pub const FALLBACK_REPLY: &str = "网络错误，请稍后再试。";

/// Runs one tutor turn against a stored analysis.
///
/// Appends the user's message, replays the prior transcript through the
/// tutor port, and appends the reply. A failed tutor call is swallowed into
/// the fixed fallback reply; either way the transcript grows by exactly two
/// messages. Only store failures propagate.
pub async fn run_tutor_turn(
    store: &dyn StoreService,
    tutor: &dyn TutorChatService,
    analysis: &AnalysisResult,
    user_text: &str,
) -> PortResult<ChatMessage> {
    let user_message = ChatMessage::user(user_text);
    store
        .append_chat_message(analysis.id, &user_message)
        .await?;

    let reply_text = match tutor
        .continue_chat(&analysis.chat_history, user_text, &analysis.original_text)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!(analysis_id = %analysis.id, "Tutor call failed: {e}");
            FALLBACK_REPLY.to_string()
        }
    };

    let reply = ChatMessage::model(reply_text);
    store.append_chat_message(analysis.id, &reply).await?;

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::analyze_task::greeting_for;
    use crate::web::testing::{sample_payload, MockStore, MockTutor};
    use litmaster_core::domain::{AnalysisResult, ChatRole, TextType};

    fn stored_analysis() -> AnalysisResult {
        let mut analysis =
            AnalysisResult::from_payload(sample_payload(), TextType::Poetry, "春眠不觉晓");
        analysis
            .chat_history
            .push(ChatMessage::model(greeting_for(TextType::Poetry)));
        analysis
    }

    #[tokio::test]
    async fn a_turn_appends_exactly_two_messages() {
        let store = MockStore::default();
        let tutor = MockTutor::replying("这首诗抒发了惜春之情。");
        let analysis = stored_analysis();

        let reply = run_tutor_turn(&store, &tutor, &analysis, "主旨是什么？")
            .await
            .unwrap();

        assert_eq!(reply.role, ChatRole::Model);
        assert_eq!(reply.text, "这首诗抒发了惜春之情。");

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].1.role, ChatRole::User);
        assert_eq!(appended[0].1.text, "主旨是什么？");
        assert_eq!(appended[1].1, reply);
    }

    #[tokio::test]
    async fn prior_turns_and_context_reach_the_tutor() {
        let store = MockStore::default();
        let tutor = MockTutor::replying("好的。");
        let analysis = stored_analysis();

        run_tutor_turn(&store, &tutor, &analysis, "再讲讲意象")
            .await
            .unwrap();

        let seen = tutor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (history_len, new_message, context) = &seen[0];
        // Prior turns only; the new message travels separately.
        assert_eq!(*history_len, analysis.chat_history.len());
        assert_eq!(new_message, "再讲讲意象");
        assert_eq!(context, "春眠不觉晓");
    }

    #[tokio::test]
    async fn tutor_failure_becomes_the_fallback_reply() {
        let store = MockStore::default();
        let tutor = MockTutor::failing();
        let analysis = stored_analysis();

        let reply = run_tutor_turn(&store, &tutor, &analysis, "主旨是什么？")
            .await
            .unwrap();

        assert_eq!(reply.role, ChatRole::Model);
        assert_eq!(reply.text, FALLBACK_REPLY);

        // The apology still counts as the model message: +2, prior untouched.
        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].1.text, "主旨是什么？");
        assert_eq!(appended[1].1.text, FALLBACK_REPLY);
    }
}
