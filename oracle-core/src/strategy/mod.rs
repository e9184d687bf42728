//! Strategies for provider-specific behaviors.
//!
//! Providers differ in how they can be asked for structured output
//! (JSON Schema vs JSON Object).

pub mod json_output;

pub use json_output::{detect_json_strategy, JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy};
