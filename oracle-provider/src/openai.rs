//! OpenAI provider implementation using async-openai crate.
//!
//! One call is one attempt: the client's built-in backoff is switched off so
//! that retrying stays with the executor's policy, and every attempt is bounded
//! by the configured request timeout.

use async_openai::config::OpenAIConfig;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionNamedToolChoice,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse, FunctionCall, FunctionName, FunctionObject,
    ResponseFormat as OpenAIResponseFormat,
    ResponseFormatJsonSchema as OpenAIResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use oracle_core::config::{Settings, DEFAULT_REQUEST_TIMEOUT};
use oracle_core::error::AiError;
use oracle_core::provider::Provider;
use oracle_core::types::*;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI provider using async-openai
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    info: Arc<ProviderInfo>,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the default timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self, AiError> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a provider from process settings
    pub fn from_settings(settings: &Settings) -> Result<Self, AiError> {
        OpenAiBuilder::from_settings(settings).build()
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Per-attempt request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert our Message type to OpenAI's ChatCompletionRequestMessage
    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage, AiError> {
        let content = msg.text();

        match msg.role {
            Role::System => {
                let mut args = ChatCompletionRequestSystemMessageArgs::default();
                args.content(content);
                if let Some(name) = &msg.name {
                    args.name(name);
                }
                let msg = args.build().map_err(|e| {
                    AiError::invalid_request(format!("Failed to build system message: {}", e))
                })?;
                Ok(ChatCompletionRequestMessage::System(msg))
            }
            Role::User => {
                let mut args = ChatCompletionRequestUserMessageArgs::default();
                args.content(content);
                if let Some(name) = &msg.name {
                    args.name(name);
                }
                let msg = args.build().map_err(|e| {
                    AiError::invalid_request(format!("Failed to build user message: {}", e))
                })?;
                Ok(ChatCompletionRequestMessage::User(msg))
            }
            Role::Assistant => {
                let tool_calls = msg
                    .tool_calls()
                    .filter_map(|part| match part {
                        ContentPart::ToolCall {
                            id,
                            name,
                            arguments,
                        } => Some(ChatCompletionMessageToolCall {
                            id: id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: name.clone(),
                                arguments: json_to_text(arguments),
                            },
                        }),
                        _ => None,
                    })
                    .collect::<Vec<_>>();

                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !content.is_empty() {
                    args.content(content);
                }
                if !tool_calls.is_empty() {
                    args.tool_calls(tool_calls);
                }
                if let Some(name) = &msg.name {
                    args.name(name);
                }
                let msg = args.build().map_err(|e| {
                    AiError::invalid_request(format!("Failed to build assistant message: {}", e))
                })?;
                Ok(ChatCompletionRequestMessage::Assistant(msg))
            }
            Role::Tool => {
                let (id, result) = msg
                    .content
                    .iter()
                    .find_map(|part| match part {
                        ContentPart::ToolResult { id, result } => Some((id, result)),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        AiError::invalid_request("tool message carries no tool result")
                    })?;

                let msg = ChatCompletionRequestToolMessageArgs::default()
                    .content(json_to_text(result))
                    .tool_call_id(id)
                    .build()
                    .map_err(|e| {
                        AiError::invalid_request(format!("Failed to build tool message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::Tool(msg))
            }
        }
    }

    /// Convert our ResponseFormat to OpenAI's ResponseFormat
    fn convert_response_format(format: &ResponseFormat) -> OpenAIResponseFormat {
        match format {
            ResponseFormat::Text => OpenAIResponseFormat::Text,
            ResponseFormat::JsonObject => OpenAIResponseFormat::JsonObject,
            ResponseFormat::JsonSchema {
                name,
                schema,
                strict,
            } => OpenAIResponseFormat::JsonSchema {
                json_schema: OpenAIResponseFormatJsonSchema {
                    name: name.clone(),
                    schema: Some(schema.clone()),
                    strict: Some(*strict),
                    description: None,
                },
            },
        }
    }

    fn convert_tool(tool: &Tool) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: tool.strict,
            },
        }
    }

    fn convert_tool_choice(choice: &ToolChoice) -> ChatCompletionToolChoiceOption {
        match choice {
            ToolChoice::None => ChatCompletionToolChoiceOption::None,
            ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
            ToolChoice::Required => ChatCompletionToolChoiceOption::Required,
            ToolChoice::Function { name } => {
                ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionName { name: name.clone() },
                })
            }
        }
    }

    /// Build CreateChatCompletionRequest from our ChatCompletionRequest
    #[allow(deprecated)]
    fn build_request(req: &ChatCompletionRequest) -> Result<CreateChatCompletionRequest, AiError> {
        let messages: Result<Vec<_>, _> = req.messages.iter().map(Self::convert_message).collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&req.model).messages(messages?);

        if let Some(max_tokens) = req.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = req.temperature {
            builder.temperature(temperature);
        }
        if let Some(top_p) = req.top_p {
            builder.top_p(top_p);
        }
        if let Some(frequency_penalty) = req.frequency_penalty {
            builder.frequency_penalty(frequency_penalty);
        }
        if let Some(presence_penalty) = req.presence_penalty {
            builder.presence_penalty(presence_penalty);
        }
        if let Some(logit_bias) = &req.logit_bias {
            builder.logit_bias(
                logit_bias
                    .iter()
                    .map(|(token, bias)| (token.clone(), serde_json::Value::from(*bias)))
                    .collect::<std::collections::HashMap<_, _>>(),
            );
        }
        if let Some(seed) = req.seed {
            builder.seed(seed);
        }
        if let Some(user) = &req.user {
            builder.user(user);
        }
        if let Some(tools) = &req.tools {
            builder.tools(tools.iter().map(Self::convert_tool).collect::<Vec<_>>());
        }
        if let Some(tool_choice) = &req.tool_choice {
            builder.tool_choice(Self::convert_tool_choice(tool_choice));
        }
        if let Some(response_format) = &req.response_format {
            builder.response_format(Self::convert_response_format(response_format));
        }

        builder
            .build()
            .map_err(|e| AiError::invalid_request(format!("Failed to build request: {}", e)))
    }

    /// Convert OpenAI response to our ChatCompletionResponse
    fn convert_response(response: CreateChatCompletionResponse) -> ChatCompletionResponse {
        let choices = response
            .choices
            .into_iter()
            .map(|choice| {
                let mut content = Vec::new();
                if let Some(text) = choice.message.content {
                    content.push(ContentPart::Text { text });
                }
                for call in choice.message.tool_calls.unwrap_or_default() {
                    content.push(ContentPart::ToolCall {
                        id: call.id,
                        name: call.function.name,
                        arguments: serde_json::from_str(&call.function.arguments)
                            .unwrap_or(serde_json::Value::String(call.function.arguments)),
                    });
                }

                let message = Message {
                    role: match choice.message.role {
                        async_openai::types::Role::System => Role::System,
                        async_openai::types::Role::User => Role::User,
                        async_openai::types::Role::Tool => Role::Tool,
                        _ => Role::Assistant,
                    },
                    content,
                    name: None,
                };

                let finish_reason = choice
                    .finish_reason
                    .map_or(FinishReason::Stop, |r| match r {
                        async_openai::types::FinishReason::Stop => FinishReason::Stop,
                        async_openai::types::FinishReason::Length => FinishReason::Length,
                        async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
                        async_openai::types::FinishReason::ContentFilter => {
                            FinishReason::ContentFilter
                        }
                        other => FinishReason::Other(format!("{:?}", other)),
                    });

                Choice {
                    index: choice.index,
                    message,
                    finish_reason,
                    refusal: choice.message.refusal,
                }
            })
            .collect();

        let usage = response.usage.map_or(Usage::default(), |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        ChatCompletionResponse {
            id: response.id,
            model: response.model,
            choices,
            usage,
            created: Some(response.created as u64),
            system_fingerprint: response.system_fingerprint,
        }
    }
}

/// Tool arguments and results travel as strings on the wire.
fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map an async-openai error onto the retry-relevant error kinds.
pub fn classify_error(err: OpenAIError) -> AiError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => AiError::timeout(e.to_string()),
        OpenAIError::Reqwest(e) => AiError::Network(e),
        OpenAIError::ApiError(api) => classify_api_error(api),
        OpenAIError::JSONDeserialize(e, body) => {
            tracing::debug!(body = %body, "undecodable response body");
            AiError::Serialization(e)
        }
        OpenAIError::InvalidArgument(msg) => AiError::invalid_request(msg),
        other => AiError::provider(format!("OpenAI API error: {}", other)),
    }
}

/// The HTTP status is not exposed for error bodies, so rate limits are
/// recognised from the body: OpenAI's codes and types, and Azure's `"429"`
/// code. A 429 whose body is not JSON surfaces as `Serialization` and is not
/// retried.
fn classify_api_error(api: ApiError) -> AiError {
    let code = api.code.as_deref().unwrap_or_default();
    let kind = api.r#type.as_deref().unwrap_or_default();
    let message = api.message;

    match (code, kind) {
        ("rate_limit_exceeded" | "429", _)
        | (
            _,
            "requests"
            | "tokens"
            | "insufficient_quota"
            | "rate_limit_reached_error"
            | "rate_limit_error",
        ) => AiError::rate_limit(message),
        ("invalid_api_key", _) | (_, "authentication_error") => AiError::authentication(message),
        ("model_not_found", _) => AiError::model_not_found(message),
        ("timeout", _) | (_, "timeout") => AiError::timeout(message),
        (_, "invalid_request_error") => AiError::invalid_request(message),
        _ => AiError::provider(format!("OpenAI API error: {}", message)),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        let openai_req = Self::build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(classify_error)?;

        Ok(Self::convert_response(response))
    }
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiBuilder {
    /// Start from process settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: Some(settings.api_key.clone()),
            api_base: settings.api_base.clone(),
            org_id: settings.organization.clone(),
            timeout: Some(settings.request_timeout),
        }
    }

    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible APIs like DeepSeek)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the per-attempt request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, AiError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// This is useful for OpenAI-compatible APIs like DeepSeek that use
    /// the same protocol but different endpoints.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, AiError> {
        let api_key = self
            .api_key
            .ok_or_else(|| AiError::configuration("API key is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        // Zero elapsed budget: the first failure is returned instead of retried.
        let no_backoff = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(config)
            .with_http_client(http_client)
            .with_backoff(no_backoff);

        tracing::debug!(?timeout, "built OpenAI-compatible client");

        Ok(OpenAiProvider {
            client,
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
            timeout,
        })
    }
}
