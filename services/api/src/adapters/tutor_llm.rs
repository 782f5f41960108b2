//! services/api/src/adapters/tutor_llm.rs
//!
//! This module contains the adapter for the follow-up tutor conversation.
//! It implements the `TutorChatService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use litmaster_core::{
    domain::{ChatMessage, ChatRole},
    ports::{PortError, PortResult, TutorChatService},
};
use regex::Regex;

use super::prompts::METHODOLOGY_INSTRUCTION;

/// Substituted when the endpoint returns an empty reply.
const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't generate a response.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TutorChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTutorAdapter {
    /// Creates a new `OpenAiTutorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// The tutor's instructions: the fixed methodology plus the analyzed
    /// text as grounding context for the discussion.
    fn build_instructions(context_text: &str) -> String {
        format!(
            "{}\n\nContext Text for discussion:\n{}",
            METHODOLOGY_INSTRUCTION, context_text
        )
    }

    /// Maps a stored transcript turn onto the wire message for its role.
    fn replay_turn(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let msg = match message.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.text.as_str())
                .build()?
                .into(),
            ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.text.as_str())
                .build()?
                .into(),
        };
        Ok(msg)
    }

    /// Strips markdown emphasis markers the model sometimes sprinkles into
    /// replies, so transcripts stay plain text.
    fn strip_markdown(text: &str) -> String {
        let emphasis = Regex::new(r"\*\*|__").unwrap();
        emphasis.replace_all(text, "").to_string()
    }
}

//=========================================================================================
// `TutorChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TutorChatService for OpenAiTutorAdapter {
    /// Replays the prior transcript in order and submits exactly one new
    /// user message. The whole history travels on every turn; there is no
    /// truncation, token budget, or retry.
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        context_text: &str,
    ) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len() + 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::build_instructions(context_text))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        for turn in history {
            messages
                .push(Self::replay_turn(turn).map_err(|e| PortError::Unexpected(e.to_string()))?);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(new_message)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());

        Ok(Self::strip_markdown(&reply))
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_append_context_text() {
        let instructions = OpenAiTutorAdapter::build_instructions("床前明月光");
        assert!(instructions.contains("语文冲刺提分教练"));
        assert!(instructions.ends_with("Context Text for discussion:\n床前明月光"));
    }

    #[test]
    fn replay_maps_roles_onto_wire_messages() {
        let user_turn = OpenAiTutorAdapter::replay_turn(&ChatMessage::user("主旨是什么？")).unwrap();
        assert!(matches!(user_turn, ChatCompletionRequestMessage::User(_)));

        let model_turn = OpenAiTutorAdapter::replay_turn(&ChatMessage::model("这首诗……")).unwrap();
        assert!(matches!(
            model_turn,
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn strip_markdown_removes_emphasis_markers() {
        assert_eq!(
            OpenAiTutorAdapter::strip_markdown("这里运用了**比喻**的手法"),
            "这里运用了比喻的手法"
        );
        assert_eq!(OpenAiTutorAdapter::strip_markdown("__主旨__"), "主旨");
        assert_eq!(OpenAiTutorAdapter::strip_markdown("plain"), "plain");
    }
}
