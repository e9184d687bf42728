//! # Oracle Providers
//!
//! Chat-completion provider implementations.

pub mod openai;

// Re-exports
pub use openai::{classify_error, OpenAiBuilder, OpenAiProvider};

use oracle_core::error::AiError;

/// Create a DeepSeek provider (OpenAI-compatible)
///
/// DeepSeek uses the OpenAI API protocol with a different endpoint and no
/// JSON Schema decoding, so executors built on it fall back to JSON mode.
///
/// # Example
///
/// ```ignore
/// use oracle_provider::deepseek;
///
/// let provider = deepseek("your-api-key")?;
/// ```
pub fn deepseek(api_key: impl Into<String>) -> Result<OpenAiProvider, AiError> {
    OpenAiProvider::builder()
        .api_key(api_key)
        .api_base("https://api.deepseek.com/v1")
        .build_with_id("deepseek", "DeepSeek")
}
