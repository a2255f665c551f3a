//! Gemini API client struct and HTTP plumbing.

use muse_common::ModelVariant;
use serde_json::Value;
use tracing::debug;

use crate::AiError;

use super::config::GeminiConfig;
use super::wire::classify_error;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub(crate) fn api_key(&self) -> Result<&str, AiError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AiError::Configuration(format!(
                "no API key configured; set {} or api.api_key",
                self.config.api_key_env
            ))
        })
    }

    pub(crate) fn chat_url(&self, model: ModelVariant) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url,
            model.model_id()
        )
    }

    pub(crate) fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    /// Operation names are resource paths relative to the API root.
    pub(crate) fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url, name.trim_start_matches('/'))
    }

    /// POST a JSON body and return the successful response, classifying
    /// HTTP failures.
    pub(crate) async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, AiError> {
        let response = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Self::check_status(response).await
    }

    pub(crate) async fn get_json(&self, url: &str) -> Result<Value, AiError> {
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", self.api_key()?)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Gemini API error response");
        Err(classify_error(status.as_u16(), &text))
    }

    /// Download a generated file (e.g. a finished video) by URI.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, AiError> {
        debug!(uri, "Downloading generated file");
        let response = self
            .http
            .get(uri)
            .header("x-goog-api-key", self.api_key()?)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
