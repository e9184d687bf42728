//! Error types for Oracle operations.

/// The main error type for chat-completion operations.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Provider-specific errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limit errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response is unusable: no content and no tool calls in its first
    /// choice, or structured output that does not match the schema
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found errors
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Timeout errors
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl AiError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a model not found error
    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Self::ModelNotFound(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this is a retryable error.
    ///
    /// Only rate limiting and request timeouts are transient. Everything else,
    /// including [`AiError::InvalidResponse`], is surfaced on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::Timeout(_) | AiError::RateLimit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_and_timeout_are_retryable() {
        assert!(AiError::rate_limit("slow down").is_retryable());
        assert!(AiError::timeout("30s elapsed").is_retryable());

        assert!(!AiError::invalid_response("empty choice").is_retryable());
        assert!(!AiError::invalid_request("bad schema").is_retryable());
        assert!(!AiError::authentication("bad key").is_retryable());
        assert!(!AiError::provider("500").is_retryable());
    }

    #[test]
    fn test_display_includes_kind() {
        assert_eq!(
            AiError::invalid_response("no choices in response").to_string(),
            "Invalid response: no choices in response"
        );
        assert_eq!(AiError::rate_limit("429").to_string(), "Rate limit exceeded: 429");
        assert_eq!(AiError::other("boom").to_string(), "Error: boom");
    }
}
