//! Process-wide settings read from the environment.

use crate::error::AiError;
use std::time::Duration;

/// Per-attempt request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the remote completion service
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub api_base: Option<String>,
    pub organization: Option<String>,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("organization", &self.organization)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Settings {
    /// Settings with an API key and the default timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
            organization: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read settings from the process environment.
    ///
    /// | variable                      | meaning                           |
    /// |-------------------------------|-----------------------------------|
    /// | `OPENAI_API_KEY`              | API key (or `OPEN_AI_API_KEY`)    |
    /// | `OPENAI_API_BASE`             | base URL, optional                |
    /// | `OPENAI_ORG_ID`               | organisation, optional            |
    /// | `ORACLE_REQUEST_TIMEOUT_SECS` | per-attempt timeout, default 60   |
    pub fn from_env() -> Result<Self, AiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("OPENAI_API_KEY")
            .or_else(|| non_empty("OPEN_AI_API_KEY"))
            .ok_or_else(|| AiError::configuration("OPENAI_API_KEY is not set"))?;

        let request_timeout = match non_empty("ORACLE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            api_key,
            api_base: non_empty("OPENAI_API_BASE"),
            organization: non_empty("OPENAI_ORG_ID"),
            request_timeout,
        })
    }

    /// Set API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set per-attempt request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, AiError> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        AiError::configuration(format!("ORACLE_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(AiError::configuration(format!(
            "ORACLE_REQUEST_TIMEOUT_SECS must be positive, got {raw}"
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| {
        AiError::configuration(format!("ORACLE_REQUEST_TIMEOUT_SECS is out of range: {raw}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(settings, Settings::new("sk-test"));
        assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_legacy_key_name_and_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPEN_AI_API_KEY", "sk-legacy"),
            ("OPENAI_API_BASE", "https://api.deepseek.com"),
            ("ORACLE_REQUEST_TIMEOUT_SECS", "12.5"),
        ]))
        .unwrap();

        assert_eq!(settings.api_key, "sk-legacy");
        assert_eq!(settings.api_base.as_deref(), Some("https://api.deepseek.com"));
        assert_eq!(settings.request_timeout, Duration::from_millis(12_500));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, AiError::Configuration(_)));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        for raw in ["soon", "0", "-3", "1e30", "inf"] {
            let err = Settings::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("ORACLE_REQUEST_TIMEOUT_SECS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, AiError::Configuration(_)), "{raw}");
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", Settings::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
    }
}
