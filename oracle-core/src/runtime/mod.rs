//! Runtime layer for Oracle.
//!
//! The runtime sits between callers holding a [`Conversation`](crate::types::Conversation)
//! and the low-level provider interface (chat_completion). It is responsible for:
//! - Converting conversations into provider requests
//! - Selecting the structured-output strategy (JSON Schema vs JSON Mode)
//! - Retrying transient transport failures
//! - Validating response shape and parsing structured output

pub mod executor;

pub use executor::{validate_response, RequestExecutor, RequestExecutorBuilder};
