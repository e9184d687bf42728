//! # Oracle Layers
//!
//! Built-in layers for Oracle providers.
//!
//! - `LoggingLayer`: Logs every chat completion with timing information
//! - `RetryLayer`: Retries rate limits and timeouts with exponential backoff
//!
//! ## Usage
//!
//! ```ignore
//! use oracle_core::RequestExecutor;
//! use oracle_layer::LoggingLayer;
//!
//! let executor = RequestExecutor::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```
//!
//! The executor already retries its transport step; `RetryLayer` is for
//! providers used on their own.

pub mod logging;
pub mod retry;

// Re-exports
pub use logging::LoggingLayer;
pub use retry::RetryLayer;
