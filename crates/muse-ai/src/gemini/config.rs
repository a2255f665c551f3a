//! Gemini API client configuration.

use std::time::Duration;

use muse_config::schema::{ApiConfig, DEFAULT_BASE_URL};

/// Gemini API client configuration.
///
/// `api_key` may be absent: the client still builds, and the missing
/// credential surfaces as a configuration error when a session is opened.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
        }
    }

    /// Build from the `[api]` config section, resolving the key from the
    /// file or the configured environment variable.
    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            api_key: api.resolve_api_key(),
            api_key_env: api.api_key_env.clone(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(u64::from(api.connect_timeout_secs)),
            request_timeout: Duration::from_secs(u64::from(api.request_timeout_secs)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
