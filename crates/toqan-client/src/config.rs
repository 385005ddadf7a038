//! Configuration for the Toqan client.

use std::env;
use std::time::Duration;

use crate::error::ToqanError;

/// Default Toqan API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coco.prod.toqan.ai/api";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for connecting to the Toqan API.
#[derive(Clone)]
pub struct ToqanConfig {
    /// Base URL of the API (e.g., "https://api.coco.prod.toqan.ai/api").
    pub base_url: String,

    /// API key sent in the `x-api-key` header.
    pub api_key: String,

    /// Optional per-request HTTP timeout.
    /// Independent of the polling timeout used while waiting for answers.
    pub http_timeout: Option<Duration>,
}

impl Default for ToqanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            http_timeout: None,
        }
    }
}

impl ToqanConfig {
    /// Create a configuration with the given API key and the default base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `TOQAN_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `TOQAN_API_URL` - Base URL (default: https://api.coco.prod.toqan.ai/api)
    /// - `TOQAN_HTTP_TIMEOUT_SECS` - Per-request HTTP timeout (default: none)
    ///
    /// An empty `TOQAN_API_URL` falls back to the default, matching how an
    /// unset base URL override is treated.
    pub fn from_env() -> Result<Self, ToqanError> {
        let api_key = env::var("TOQAN_API_KEY")
            .map_err(|_| ToqanError::Config("TOQAN_API_KEY not set".to_string()))?;

        let base_url = env::var("TOQAN_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http_timeout = env::var("TOQAN_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            api_key,
            http_timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> ToqanConfigBuilder {
        ToqanConfigBuilder::default()
    }

    /// Check that the configuration can be used to make requests.
    pub fn validate(&self) -> Result<(), ToqanError> {
        if self.api_key.trim().is_empty() {
            return Err(ToqanError::Config("API key is empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ToqanError::Config("base URL is empty".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ToqanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToqanConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Builder for ToqanConfig.
#[derive(Debug, Default)]
pub struct ToqanConfigBuilder {
    config: ToqanConfig,
}

impl ToqanConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ToqanConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ToqanConfig::default();

        assert_eq!(config.base_url, "https://api.coco.prod.toqan.ai/api");
        assert!(config.api_key.is_empty());
        assert!(config.http_timeout.is_none());
    }

    #[test]
    fn test_builder_all_options() {
        let config = ToqanConfig::builder()
            .api_key("sk_test")
            .base_url("http://localhost:9000/api")
            .http_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.api_key, "sk_test");
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate() {
        assert!(ToqanConfig::default().validate().is_err());
        assert!(ToqanConfig::new("sk_test").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ToqanConfig::new("sk_secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk_secret"));
        assert!(rendered.contains("<redacted>"));
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        fn clear_all_toqan_vars() {
            std::env::remove_var("TOQAN_API_KEY");
            std::env::remove_var("TOQAN_API_URL");
            std::env::remove_var("TOQAN_HTTP_TIMEOUT_SECS");
        }

        // Scenario 1: Missing API key should error
        clear_all_toqan_vars();
        match ToqanConfig::from_env() {
            Err(ToqanError::Config(msg)) => assert!(msg.contains("TOQAN_API_KEY")),
            other => panic!("Expected Config error, got {:?}", other),
        }

        // Scenario 2: Only API key set, defaults used
        clear_all_toqan_vars();
        std::env::set_var("TOQAN_API_KEY", "sk_env");
        let config = ToqanConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk_env");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.http_timeout.is_none());

        // Scenario 3: Empty URL override falls back to the default
        std::env::set_var("TOQAN_API_URL", "");
        let config = ToqanConfig::from_env().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        // Scenario 4: All vars set
        std::env::set_var("TOQAN_API_URL", "http://127.0.0.1:8080/api");
        std::env::set_var("TOQAN_HTTP_TIMEOUT_SECS", "15");
        let config = ToqanConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));

        clear_all_toqan_vars();
    }
}
