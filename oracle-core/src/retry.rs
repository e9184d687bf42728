//! Retry policy with exponential backoff.
//!
//! A [`RetryPolicy`] is an explicit value: which errors to retry, how many
//! attempts in total, and how long to wait between them. It wraps a single
//! transport step and keeps no state between calls.

use crate::error::AiError;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether an error is worth another attempt
pub type RetryPredicate = Arc<dyn Fn(&AiError) -> bool + Send + Sync>;

/// Retry policy configuration
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    retry_on: RetryPredicate,
}

impl Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Three attempts in total, retrying rate limits and timeouts, waiting
    /// 1s then 2s.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            retry_on: Arc::new(AiError::is_retryable),
        }
    }

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self::new().with_max_attempts(1)
    }

    /// Set the total number of attempts, including the first one.
    ///
    /// Values below one are treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Replace the retry predicate
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&AiError) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Arc::new(predicate);
        self
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether `err` would be retried by this policy
    pub fn should_retry(&self, err: &AiError) -> bool {
        (self.retry_on)(err)
    }

    /// Delay after the `failed_attempts`-th failure (zero-based)
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(failed_attempts as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !self.should_retry(&e) || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt - 1);
                    tracing::warn!(
                        error = %e,
                        "Attempt {}/{} failed, retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        delay
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new().with_max_delay(Duration::from_secs(3));

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(3));
        assert_eq!(policy.delay_for(10), Duration::from_secs(3));
    }

    #[test]
    fn test_max_attempts_floor_is_one() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new();

        let result: Result<(), AiError> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::rate_limit("429")) }
            })
            .await;

        assert!(matches!(result, Err(AiError::RateLimit(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new();
        let start = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AiError::timeout("read timed out"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        // 1s after the first failure, 2s after the second
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate_controls_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new().with_predicate(|e| matches!(e, AiError::Provider(_)));

        let result: Result<(), AiError> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::rate_limit("429")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
