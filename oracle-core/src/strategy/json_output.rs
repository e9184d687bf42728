//! JSON output strategies for different providers.
//!
//! - JsonSchemaStrategy: providers that support strict JSON Schema decoding (OpenAI)
//! - JsonModeStrategy: compatible endpoints that only support basic JSON object mode (DeepSeek)

use crate::error::AiError;
use crate::schema::OutputSchema;
use crate::types::{ChatCompletionRequest, Message, ResponseFormat};

/// Strategy for requesting schema-constrained output in a chat completion.
pub trait JsonOutputStrategy: Send + Sync {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Rewrite `req` so the service shapes its answer after `schema`.
    ///
    /// Any response format already on the request is replaced.
    fn apply(&self, req: &mut ChatCompletionRequest, schema: &OutputSchema)
        -> Result<(), AiError>;
}

/// Native JSON Schema decoding, via `response_format.json_schema`.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaStrategy;

impl JsonSchemaStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl JsonOutputStrategy for JsonSchemaStrategy {
    fn name(&self) -> &str {
        "JsonSchemaStrategy"
    }

    fn apply(
        &self,
        req: &mut ChatCompletionRequest,
        schema: &OutputSchema,
    ) -> Result<(), AiError> {
        req.response_format = Some(ResponseFormat::JsonSchema {
            name: schema.name.clone(),
            schema: schema.schema.clone(),
            strict: schema.strict,
        });

        Ok(())
    }
}

/// JSON Mode strategy for endpoints that only support basic JSON object mode.
///
/// Sets `response_format` to JsonObject and prepends the schema as a system
/// instruction, since the service cannot enforce it.
#[derive(Debug, Clone, Default)]
pub struct JsonModeStrategy;

impl JsonModeStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Build a JSON instruction from a schema
    fn build_json_instruction(schema: &OutputSchema) -> Result<String, AiError> {
        let schema_str = serde_json::to_string_pretty(&schema.schema)?;
        Ok(format!(
            "You must respond with valid JSON that matches this schema:\n```json\n{}\n```\n\n\
            Only return the JSON object, nothing else. \
            Ensure all required fields are present and use the correct data types.",
            schema_str
        ))
    }
}

impl JsonOutputStrategy for JsonModeStrategy {
    fn name(&self) -> &str {
        "JsonModeStrategy"
    }

    fn apply(
        &self,
        req: &mut ChatCompletionRequest,
        schema: &OutputSchema,
    ) -> Result<(), AiError> {
        req.response_format = Some(ResponseFormat::JsonObject);

        let instruction = Self::build_json_instruction(schema)?;
        req.messages.insert(0, Message::system(instruction));

        Ok(())
    }
}

/// Pick the JSON output strategy for a provider id.
pub fn detect_json_strategy(provider_id: &str) -> Box<dyn JsonOutputStrategy> {
    match provider_id {
        "openai" | "azure" => Box::new(JsonSchemaStrategy::new()),
        // DeepSeek and unknown OpenAI-compatible endpoints
        _ => Box::new(JsonModeStrategy::new()),
    }
}
