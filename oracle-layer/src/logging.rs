//! Logging layer for provider operations.

use async_trait::async_trait;
use oracle_core::error::AiError;
use oracle_core::layer::{Layer, LayeredProvider};
use oracle_core::provider::Provider;
use oracle_core::types::*;

/// Logging layer that logs provider operations.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Oracle]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        let format = match &req.response_format {
            Some(ResponseFormat::JsonSchema { name, .. }) => format!("json_schema:{}", name),
            Some(ResponseFormat::JsonObject) => "json_object".to_string(),
            Some(ResponseFormat::Text) => "text".to_string(),
            None => "default".to_string(),
        };
        tracing::debug!(
            "{} chat_completion request: model={}, messages={}, format={}",
            self.prefix,
            req.model,
            req.messages.len(),
            format
        );

        let start = std::time::Instant::now();
        let result = self.inner.chat_completion(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} chat_completion success: id={}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.id,
                    response.usage.total_tokens,
                    elapsed
                );
            }
            // The executor reports the final failure; a single attempt may still be retried.
            Err(e) => {
                tracing::warn!(
                    "{} chat_completion error: {:?}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

oracle_core::impl_layered_provider!(LoggingProvider);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log lines in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "echo".to_string(),
                name: "Echo".to_string(),
            })
        }

        async fn chat_completion(
            &self,
            req: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, AiError> {
            if req.messages.is_empty() {
                return Err(AiError::invalid_request("no messages"));
            }
            Ok(ChatCompletionResponse {
                id: "echo-1".to_string(),
                model: req.model,
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(req.messages[0].text()),
                    finish_reason: FinishReason::Stop,
                    refusal: None,
                }],
                usage: Usage::default(),
                created: None,
                system_fingerprint: None,
            })
        }
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let provider = LoggingLayer::with_prefix("[test]").layer(EchoProvider);

        let ok = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("ping")]))
            .await
            .unwrap();
        assert_eq!(ok.choices[0].message.text(), "ping");

        let err = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidRequest(_)));

        assert_eq!(provider.info().name, "Echo");
    }

    #[tokio::test]
    async fn test_failed_attempt_is_logged_as_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let provider = LoggingLayer::new().layer(EchoProvider);
        let _ = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![]))
            .await;

        let output = logs.contents();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("chat_completion error"), "{output}");
        assert!(!output.contains("ERROR"), "{output}");
    }
}
