//! Retry layer around a provider.

use async_trait::async_trait;
use oracle_core::error::AiError;
use oracle_core::layer::{Layer, LayeredProvider};
use oracle_core::provider::Provider;
use oracle_core::retry::RetryPolicy;
use oracle_core::types::*;
use std::time::Duration;

/// Retry layer: wraps every chat completion of the inner provider in a
/// [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    /// Create a new retry layer with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a retry layer from an explicit policy
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Set the total number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(max_attempts);
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.policy = self.policy.with_initial_delay(initial_delay);
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.policy = self.policy.with_max_delay(max_delay);
        self
    }

    /// Set backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy = self.policy.with_backoff_multiplier(multiplier);
        self
    }
}

impl<P: Provider> Layer<P> for RetryLayer {
    type LayeredProvider = RetryProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        RetryProvider {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Provider wrapped with retry logic
#[derive(Debug)]
pub struct RetryProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

#[async_trait]
impl<P: Provider> LayeredProvider for RetryProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiError> {
        self.policy
            .run(|| {
                let req = req.clone();
                async move { self.inner.chat_completion(req).await }
            })
            .await
    }
}

oracle_core::impl_layered_provider!(RetryProvider);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails with `error` for the first `failures` calls, then answers
    #[derive(Debug)]
    struct FlakyProvider {
        failures: u32,
        error: fn() -> AiError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "flaky".to_string(),
                name: "Flaky".to_string(),
            })
        }

        async fn chat_completion(
            &self,
            req: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, AiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err((self.error)());
            }
            Ok(ChatCompletionResponse {
                id: format!("resp-{n}"),
                model: req.model,
                choices: vec![],
                usage: Usage::default(),
                created: None,
                system_fingerprint: None,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let inner = Arc::new(FlakyProvider {
            failures: 2,
            error: || AiError::rate_limit("429"),
            calls: AtomicU32::new(0),
        });
        let provider = RetryLayer::new().layer(inner.clone());

        let response = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap();

        assert_eq!(response.id, "resp-2");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.info().id, "flaky");
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_permanent_errors() {
        let inner = Arc::new(FlakyProvider {
            failures: 5,
            error: || AiError::authentication("bad key"),
            calls: AtomicU32::new(0),
        });
        let provider = RetryLayer::new().with_max_attempts(5).layer(inner.clone());

        let err = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Authentication(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
