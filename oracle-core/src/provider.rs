//! Provider trait and core abstractions.

use crate::error::AiError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core provider trait for chat-completion services.
///
/// A provider owns the transport to one remote endpoint and performs exactly
/// one attempt per call. Retrying, response validation and structured parsing
/// are handled by [`RequestExecutor`](crate::runtime::RequestExecutor).
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Chat completion (non-streaming)
    ///
    /// A request whose `response_format` is [`ResponseFormat::JsonSchema`]
    /// asks the service for schema-constrained decoding; anything else is an
    /// ordinary completion.
    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        (**self).chat_completion(req).await
    }
}
