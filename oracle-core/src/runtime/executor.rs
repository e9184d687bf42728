//! RequestExecutor implementation.
//!
//! The executor turns a [`Conversation`] into a single provider request,
//! wraps the transport step in a [`RetryPolicy`], checks the shape of the
//! response and hands back either the envelope or the parsed object.

use crate::error::AiError;
use crate::layer::Layer;
use crate::provider::Provider;
use crate::retry::RetryPolicy;
use crate::schema::OutputSchema;
use crate::strategy::{detect_json_strategy, JsonOutputStrategy};
use crate::types::*;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::Instrument;

/// Type-erased provider that can be shared across threads
type BoxedProvider = Arc<dyn Provider>;

/// Builder for composing a provider with layers, a retry policy and a JSON
/// output strategy.
///
/// # Example
///
/// ```ignore
/// let executor = RequestExecutor::builder(openai_provider)
///     .layer(LoggingLayer::new())
///     .retry(RetryPolicy::new().with_max_attempts(3))
///     .finish();
/// ```
pub struct RequestExecutorBuilder<P> {
    provider: P,
    retry: RetryPolicy,
    json_strategy: Option<Box<dyn JsonOutputStrategy>>,
}

impl<P: Provider> RequestExecutorBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(),
            json_strategy: None,
        }
    }

    /// Add a layer to wrap the provider
    ///
    /// Each call creates a new concrete type by wrapping the previous provider.
    pub fn layer<L>(self, layer: L) -> RequestExecutorBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        RequestExecutorBuilder {
            provider: layer.layer(self.provider),
            retry: self.retry,
            json_strategy: self.json_strategy,
        }
    }

    /// Replace the retry policy around the transport step
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set a custom JSON output strategy
    ///
    /// If not set, the strategy is picked from the provider ID.
    pub fn json_strategy(mut self, strategy: Box<dyn JsonOutputStrategy>) -> Self {
        self.json_strategy = Some(strategy);
        self
    }

    /// Finish building and create a RequestExecutor
    pub fn finish(self) -> RequestExecutor {
        let provider = Arc::new(self.provider);
        let provider_id = provider.info().id.clone();

        let json_strategy = self
            .json_strategy
            .unwrap_or_else(|| detect_json_strategy(&provider_id));

        RequestExecutor {
            provider,
            retry: self.retry,
            json_strategy,
        }
    }
}

/// Executes conversations against a provider.
///
/// Calls are independent of each other; an executor can be shared and used
/// concurrently.
pub struct RequestExecutor {
    provider: BoxedProvider,
    retry: RetryPolicy,
    json_strategy: Box<dyn JsonOutputStrategy>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("provider", &self.provider)
            .field("retry", &self.retry)
            .field("json_strategy", &self.json_strategy.name())
            .finish()
    }
}

impl RequestExecutor {
    /// Create a new builder
    pub fn builder<P: Provider>(provider: P) -> RequestExecutorBuilder<P> {
        RequestExecutorBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    /// Retry policy applied to every call
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute a conversation, constrained to `schema` when one is given.
    ///
    /// Returns [`CompletionResult::Structured`] exactly when `schema` is
    /// `Some`, and [`CompletionResult::Completion`] otherwise.
    pub async fn execute(
        &self,
        conversation: &Conversation,
        schema: Option<&OutputSchema>,
    ) -> Result<CompletionResult, AiError> {
        match schema {
            Some(schema) => self
                .execute_with_schema(conversation, schema)
                .await
                .map(CompletionResult::Structured),
            None => self
                .execute_completion(conversation)
                .await
                .map(CompletionResult::Completion),
        }
    }

    /// Execute an unconstrained completion and return the full envelope
    pub async fn execute_completion(
        &self,
        conversation: &Conversation,
    ) -> Result<ChatCompletionResponse, AiError> {
        self.run(conversation, None).await
    }

    /// Execute a schema-constrained completion and return the parsed JSON
    pub async fn execute_with_schema(
        &self,
        conversation: &Conversation,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, AiError> {
        let response = self.run(conversation, Some(schema)).await?;
        parse_structured(&response, schema)
    }

    /// Execute a completion constrained to the schema of `T` and deserialize
    /// the answer into `T`
    pub async fn execute_structured<T>(&self, conversation: &Conversation) -> Result<T, AiError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let schema = OutputSchema::of::<T>();
        let value = self.execute_with_schema(conversation, &schema).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn run(
        &self,
        conversation: &Conversation,
        schema: Option<&OutputSchema>,
    ) -> Result<ChatCompletionResponse, AiError> {
        let span = tracing::debug_span!(
            "execute",
            request_id = %uuid::Uuid::new_v4(),
            provider = %self.provider.info().id,
            model = %conversation.config.model,
            structured = schema.is_some(),
        );

        async move {
            let req = self.build_request(conversation, schema)?;
            tracing::debug!(messages = req.messages.len(), "sending chat completion");

            let result = self
                .retry
                .run(|| {
                    let req = req.clone();
                    async move { self.provider.chat_completion(req).await }
                })
                .await
                .and_then(|response| {
                    validate_response(&response)?;
                    Ok(response)
                });

            match &result {
                Ok(response) => tracing::debug!(
                    id = %response.id,
                    tokens = response.usage.total_tokens,
                    "chat completion succeeded"
                ),
                Err(e) => tracing::error!(error = %e, "chat completion failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn build_request(
        &self,
        conversation: &Conversation,
        schema: Option<&OutputSchema>,
    ) -> Result<ChatCompletionRequest, AiError> {
        if conversation.config.model.trim().is_empty() {
            return Err(AiError::invalid_request("conversation has no model"));
        }
        if conversation.messages.is_empty() {
            return Err(AiError::invalid_request("conversation has no messages"));
        }

        let mut req = ChatCompletionRequest::from_conversation(conversation);
        if let Some(schema) = schema {
            self.json_strategy.apply(&mut req, schema)?;
        }

        Ok(req)
    }
}

/// Check that the first choice carries text or at least one tool call.
///
/// A refusal carries neither, and neither does an empty choice list.
pub fn validate_response(response: &ChatCompletionResponse) -> Result<(), AiError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| AiError::invalid_response("no choices in response"))?;

    let has_text = !choice.message.text().is_empty();
    let has_tool_calls = choice.message.tool_calls().next().is_some();
    if has_text || has_tool_calls {
        return Ok(());
    }

    Err(AiError::invalid_response(match &choice.refusal {
        Some(refusal) => format!("model refused: {refusal}"),
        None => format!(
            "first choice has neither content nor tool calls (finish_reason: {:?})",
            choice.finish_reason
        ),
    }))
}

/// Parse the first choice's text and check it against `schema`.
///
/// JSON-mode providers and non-strict schemas are not enforced server side,
/// so the object is always validated here.
fn parse_structured(
    response: &ChatCompletionResponse,
    schema: &OutputSchema,
) -> Result<serde_json::Value, AiError> {
    let content = response
        .choices
        .first()
        .map(|choice| choice.message.text())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(AiError::invalid_response(
            "schema-constrained completion returned tool calls instead of content",
        ));
    }

    let value: serde_json::Value = serde_json::from_str(strip_code_fence(&content))?;
    validate_against(&value, schema)?;
    Ok(value)
}

fn validate_against(value: &serde_json::Value, schema: &OutputSchema) -> Result<(), AiError> {
    let validator = jsonschema::validator_for(&schema.schema).map_err(|e| {
        AiError::invalid_request(format!("schema `{}` is not valid: {e}", schema.name))
    })?;

    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|e| e.to_string())
        .collect();
    if violations.is_empty() {
        return Ok(());
    }

    Err(AiError::invalid_response(format!(
        "structured output does not match schema `{}`: {}",
        schema.name,
        violations.join("; ")
    )))
}

/// JSON-mode endpoints sometimes wrap the object in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner.trim(),
        None => trimmed,
    }
}
