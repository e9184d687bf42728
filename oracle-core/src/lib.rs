//! # Oracle Core
//!
//! Core abstractions and the request executor for Oracle.
//!
//! This crate provides the provider and layer traits, the conversation and
//! completion types, the retry policy and the [`RequestExecutor`] that ties
//! them together.

pub mod config;
pub mod error;
pub mod layer;
pub mod provider;
pub mod retry;
pub mod runtime;
pub mod schema;
pub mod strategy;
pub mod types;

// Re-exports
pub use config::Settings;
pub use error::AiError;
pub use layer::{Layer, LayeredProvider};
pub use provider::Provider;
pub use retry::RetryPolicy;
pub use runtime::{RequestExecutor, RequestExecutorBuilder};
pub use schema::OutputSchema;
pub use strategy::{JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy};
pub use types::*;

/// Result type alias for Oracle operations
pub type Result<T> = std::result::Result<T, AiError>;
