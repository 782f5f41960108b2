//! services/api/src/adapters/analysis_llm.rs
//!
//! This module contains the adapter for the literary analysis LLM.
//! It implements the `TextAnalysisService` port from the `core` crate.

const USER_PROMPT_TEMPLATE: &str = r#"
Analyze the following {type} text strictly according to the 'Chinese Literature Exam' rules.

TEXT:
{text}

Generate 3-4 high-quality exam questions (e.g., about word choice, sentence role, character analysis, or thematic meaning).
Ensure the "standardAnswer" follows the specific templates (e.g., "Method + Effect + Emotion").
"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use litmaster_core::{
    domain::{AnalysisPayload, TextType},
    ports::{PortError, PortResult, TextAnalysisService},
};

use super::prompts::METHODOLOGY_INSTRUCTION;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAnalysisAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAnalysisAdapter {
    /// Creates a new `OpenAiAnalysisAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the user prompt for one analysis request.
    fn build_prompt(text: &str, text_type: TextType) -> String {
        USER_PROMPT_TEMPLATE
            .replace("{type}", text_type.as_tag())
            .replace("{text}", text)
    }

    /// The JSON schema the generation endpoint is constrained to.
    ///
    /// Schema enforcement is delegated to the provider; locally the reply is
    /// only parsed into `AnalysisPayload`, with no further validation.
    fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "A suitable title for the analysis"
                },
                "summary": {
                    "type": "string",
                    "description": "A brief summary of the text content"
                },
                "structure": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Step-by-step outline of the text structure"
                },
                "themes": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Key themes or emotions (e.g., Patriotism, Nostalgia)"
                },
                "techniques": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "example": { "type": "string" },
                            "effect": { "type": "string" }
                        },
                        "required": ["name", "example", "effect"],
                        "additionalProperties": false
                    },
                    "description": "Literary techniques found with specific examples and their effects"
                },
                "generatedQuestions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "question": {
                                "type": "string",
                                "description": "An exam-style question based on the text"
                            },
                            "type": {
                                "type": "string",
                                "description": "Category: Language, Theme, Plot, Character, etc."
                            },
                            "standardAnswer": {
                                "type": "string",
                                "description": "The standard model answer using the formulas"
                            },
                            "analysis": {
                                "type": "string",
                                "description": "Explanation of why this is the answer"
                            }
                        },
                        "required": ["id", "question", "type", "standardAnswer", "analysis"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["title", "summary", "structure", "themes", "techniques", "generatedQuestions"],
            "additionalProperties": false
        })
    }

    /// Parses the endpoint's reply text into the expected payload shape.
    fn parse_payload(raw: &str) -> PortResult<AnalysisPayload> {
        serde_json::from_str(raw).map_err(|e| {
            PortError::Unexpected(format!("Analysis response was not the expected JSON: {}", e))
        })
    }
}

//=========================================================================================
// `TextAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextAnalysisService for OpenAiAnalysisAdapter {
    /// Runs one analysis round trip: single attempt, no retry, no streaming.
    async fn analyze_text(&self, text: &str, text_type: TextType) -> PortResult<AnalysisPayload> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(METHODOLOGY_INSTRUCTION)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::build_prompt(text, text_type))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: "literary_analysis".to_string(),
                description: Some("Structured literary analysis of one text".to_string()),
                schema: Some(Self::response_schema()),
                strict: Some(true),
            },
        };

        // Lower temperature for more academic/standardized results.
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .temperature(0.3)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Unexpected("No response from AI".to_string()))?;

        Self::parse_payload(&content)
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use litmaster_core::domain::AnalysisResult;

    #[test]
    fn prompt_embeds_type_tag_and_text_verbatim() {
        let prompt = OpenAiAnalysisAdapter::build_prompt("春眠不觉晓", TextType::Poetry);
        assert!(prompt.contains("POETRY text"));
        assert!(prompt.contains("春眠不觉晓"));
        assert!(prompt.contains("Generate 3-4 high-quality exam questions"));
    }

    #[test]
    fn schema_declares_all_required_fields() {
        let schema = OpenAiAnalysisAdapter::response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["title", "summary", "structure", "themes", "techniques", "generatedQuestions"]
        );
        assert_eq!(schema["additionalProperties"], false);
    }

    // The wire shape a well-behaved provider returns for a poem.
    const CANNED_POETRY_REPLY: &str = r#"{
        "title": "春晓",
        "summary": "写春日清晨的所闻所感，惜春之情溢于言表。",
        "structure": ["起：春眠不觉晓，点明时节", "承：处处闻啼鸟，以声衬静"],
        "themes": ["惜春", "热爱自然"],
        "techniques": [
            {"name": "以声衬静", "example": "处处闻啼鸟", "effect": "烘托春晨的静谧生机"}
        ],
        "generatedQuestions": [
            {
                "id": "q1",
                "question": "\"处处闻啼鸟\"运用了什么手法？",
                "type": "Language",
                "standardAnswer": "诗句描述了春晨鸟鸣的画面，运用了以声衬静的手法，烘托了静谧的意境，抒发了诗人对春天的喜爱之情。",
                "analysis": "按照\"画面+手法+意境+感情\"的答题步骤作答。"
            }
        ]
    }"#;

    #[test]
    fn canned_reply_parses_into_payload() {
        let payload = OpenAiAnalysisAdapter::parse_payload(CANNED_POETRY_REPLY).unwrap();
        assert_eq!(payload.title, "春晓");
        assert!(!payload.summary.is_empty());
        assert_eq!(payload.generated_questions[0].question_type, "Language");
    }

    #[test]
    fn stamped_result_carries_tag_and_input() {
        let payload = OpenAiAnalysisAdapter::parse_payload(CANNED_POETRY_REPLY).unwrap();
        let result = AnalysisResult::from_payload(payload, TextType::Poetry, "春眠不觉晓");

        assert_eq!(result.text_type, TextType::Poetry);
        assert_eq!(result.original_text, "春眠不觉晓");
        assert!(!result.summary.is_empty());
        assert!(!result.structure.is_empty());
        assert!(!result.themes.is_empty());
        assert!(!result.techniques.is_empty());
        assert!(!result.generated_questions.is_empty());
    }

    #[test]
    fn malformed_reply_is_a_single_generic_failure() {
        let err = OpenAiAnalysisAdapter::parse_payload("not json at all").unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }
}
