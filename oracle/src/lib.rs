//! # Oracle
//!
//! Chat completions against OpenAI-compatible services, optionally
//! constrained to a schema, with bounded retry on rate limits and timeouts.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! oracle = { version = "0.1", features = ["openai", "layers"] }
//! ```
//!
//! ```ignore
//! use oracle::prelude::*;
//!
//! #[derive(serde::Deserialize, oracle::schemars::JsonSchema)]
//! struct Verdict {
//!     holds: bool,
//!     reason: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = oracle::openai_executor(&Settings::from_env()?)?;
//!
//! let conversation = Conversation::new(
//!     vec![Message::user("Is the earth round?")],
//!     ChatConfig::new("gpt-4o-mini"),
//! );
//!
//! let verdict: Verdict = executor.execute_structured(&conversation).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `openai` and `layers`
//! - `openai`: OpenAI provider support
//! - `layers`: Built-in layers (logging, retry)
//! - `full`: All features enabled

// Re-export core types and traits
pub use oracle_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "oracle-provider")]
pub mod provider {
    //! Chat-completion provider implementations.
    pub use oracle_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "oracle-layer")]
pub mod layer {
    //! Built-in provider layers.
    pub use oracle_layer::*;
}

/// Re-exported so callers can derive `JsonSchema` for their output types
pub mod schemars {
    pub use ::schemars::*;
}

/// Build the standard executor for the OpenAI API: one client scoped to the
/// configured timeout, the default three-attempt retry policy, and request
/// logging when the `layers` feature is on.
#[cfg(feature = "oracle-provider")]
pub fn openai_executor(settings: &Settings) -> Result<RequestExecutor> {
    let provider = provider::OpenAiProvider::from_settings(settings)?;

    #[cfg(feature = "oracle-layer")]
    let builder = RequestExecutor::builder(provider).layer(layer::LoggingLayer::new());
    #[cfg(not(feature = "oracle-layer"))]
    let builder = RequestExecutor::builder(provider);

    Ok(builder.finish())
}

/// Execute `conversation` once with settings read from the environment.
///
/// Returns the completion envelope when `schema` is `None` and the parsed
/// object otherwise. Long-lived callers should build an executor once with
/// [`openai_executor`] instead.
#[cfg(feature = "oracle-provider")]
pub async fn execute(
    conversation: &Conversation,
    schema: Option<&OutputSchema>,
) -> Result<CompletionResult> {
    let executor = openai_executor(&Settings::from_env()?)?;
    executor.execute(conversation, schema).await
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use oracle::prelude::*;
    //! ```

    pub use crate::{
        AiError, ChatConfig, CompletionResult, ContentPart, Conversation, FinishReason, Layer,
        Message, OutputSchema, Provider, RequestExecutor, Result, RetryPolicy, Role, Settings,
        Tool, ToolChoice, Usage,
    };

    #[cfg(feature = "oracle-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "oracle-layer")]
    pub use crate::layer::*;
}

#[cfg(all(test, feature = "oracle-provider"))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_openai_executor_defaults() {
        let settings = Settings::new("sk-test").with_request_timeout(Duration::from_secs(20));

        let executor = openai_executor(&settings).unwrap();

        assert_eq!(executor.info().id, "openai");
        assert_eq!(executor.retry_policy().max_attempts(), 3);
    }
}
