//! Core types for chat-completion operations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    ToolResult {
        id: String,
        result: serde_json::Value,
    },
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a new user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text { text: text.into() }],
            name: None,
        }
    }

    /// Create a new assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
            name: None,
        }
    }

    /// Create a new system message with text
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text { text: text.into() }],
            name: None,
        }
    }

    /// Create a tool result message answering the tool call `id`
    pub fn tool_result(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            role: Role::Tool,
            content: vec![ContentPart::ToolResult {
                id: id.into(),
                result,
            }],
            name: None,
        }
    }

    /// Set the message name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Concatenated text parts of this message
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool call parts of this message
    pub fn tool_calls(&self) -> impl Iterator<Item = &ContentPart> {
        self.content
            .iter()
            .filter(|part| matches!(part, ContentPart::ToolCall { .. }))
    }
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Which tool, if any, the model must call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Function { name: String },
}

/// Response format for chat completions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response
    Text,
    /// JSON object response (basic JSON mode, no schema validation)
    JsonObject,
    /// JSON Schema response (with strict schema validation)
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        strict: bool,
    },
}

/// Model and sampling parameters of a conversation.
///
/// Every field is forwarded as-is. Nothing here is defaulted or merged by the
/// executor; `None` means "not sent".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatConfig {
    /// Create a config for `model` with every parameter unset
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set response format hint
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Set end-user identifier
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// A fully populated conversation: messages plus their config bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub config: ChatConfig,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(messages: Vec<Message>, config: ChatConfig) -> Self {
        Self { messages, config }
    }
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

/// Usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Finish reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

// ============================================================================
// Chat Completion Types (Provider Interface)
// ============================================================================

/// Chat completion request as handed to a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatCompletionRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self::from_conversation(&Conversation::new(messages, ChatConfig::new(model)))
    }

    /// Copy a conversation into a request, field for field
    pub fn from_conversation(conversation: &Conversation) -> Self {
        let config = &conversation.config;
        Self {
            model: config.model.clone(),
            messages: conversation.messages.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            logit_bias: config.logit_bias.clone(),
            seed: config.seed,
            user: config.user.clone(),
            tools: config.tools.clone(),
            tool_choice: config.tool_choice.clone(),
            response_format: config.response_format.clone(),
        }
    }

    /// Set response format
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }
}

/// Single choice in chat completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: FinishReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

/// Chat completion response (the completion envelope)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

/// Outcome of one executor call.
///
/// Which variant comes back is decided only by whether an output schema was
/// supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult {
    /// Full envelope of an unconstrained completion
    Completion(ChatCompletionResponse),
    /// Object parsed from a schema-constrained completion
    Structured(serde_json::Value),
}

impl CompletionResult {
    /// The envelope, if no schema was supplied
    pub fn into_completion(self) -> Option<ChatCompletionResponse> {
        match self {
            CompletionResult::Completion(response) => Some(response),
            CompletionResult::Structured(_) => None,
        }
    }

    /// The parsed object, if a schema was supplied
    pub fn into_structured(self) -> Option<serde_json::Value> {
        match self {
            CompletionResult::Structured(value) => Some(value),
            CompletionResult::Completion(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_copies_every_config_field() {
        let mut bias = HashMap::new();
        bias.insert("50256".to_string(), -100);

        let config = ChatConfig {
            model: "gpt-4o-mini".to_string(),
            frequency_penalty: Some(0.5),
            logit_bias: Some(bias.clone()),
            max_tokens: Some(256),
            presence_penalty: Some(0.1),
            response_format: Some(ResponseFormat::JsonObject),
            seed: Some(42),
            temperature: Some(0.2),
            top_p: Some(0.9),
            tools: None,
            tool_choice: Some(ToolChoice::Auto),
            user: Some("user-1".to_string()),
        };
        let conversation = Conversation::new(vec![Message::user("hi")], config);

        let req = ChatCompletionRequest::from_conversation(&conversation);

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.messages, conversation.messages);
        assert_eq!(req.frequency_penalty, Some(0.5));
        assert_eq!(req.logit_bias, Some(bias));
        assert_eq!(req.max_tokens, Some(256));
        assert_eq!(req.presence_penalty, Some(0.1));
        assert_eq!(req.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(req.seed, Some(42));
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.top_p, Some(0.9));
        assert_eq!(req.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(req.user.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_message_text_skips_tool_parts() {
        let msg = Message {
            role: Role::Assistant,
            content: vec![
                ContentPart::Text {
                    text: "a".to_string(),
                },
                ContentPart::ToolCall {
                    id: "call_1".to_string(),
                    name: "lookup".to_string(),
                    arguments: serde_json::json!({}),
                },
                ContentPart::Text {
                    text: "b".to_string(),
                },
            ],
            name: None,
        };

        assert_eq!(msg.text(), "ab");
        assert_eq!(msg.tool_calls().count(), 1);
    }

    #[test]
    fn test_completion_result_variants_are_exclusive() {
        let structured = CompletionResult::Structured(serde_json::json!({"a": 1}));
        assert!(structured.clone().into_completion().is_none());
        assert_eq!(
            structured.into_structured(),
            Some(serde_json::json!({"a": 1}))
        );
    }
}
