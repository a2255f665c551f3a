//! Streaming conversation core for Muse.
//!
//! Provides:
//! - A Gemini REST backend with SSE streaming
//! - Lane-keyed session registry
//! - Lazy, cancellable fragment sequences for a single exchange
//! - Conversation buffers with explicit message status
//! - Quota-aware retry for one-shot image calls and bounded video polling
//! - Attachment ingestion (classification, base64, archive text extraction)

pub mod attachment;
pub mod content;
pub mod conversation;
pub mod exchange;
pub mod gemini;
pub mod media;
pub mod polling;
pub mod retry;
pub mod session;
pub mod streaming;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub use attachment::{Attachment, AttachmentDescriptor, AttachmentKind};
pub use content::{ChatRequest, Content, Part, Role};
pub use conversation::{ChatService, Conversation, FailurePolicy, Message, MessageStatus};
pub use exchange::{FragmentSequence, StreamingExchange};
pub use gemini::{GeminiClient, GeminiConfig};
pub use media::{
    GeneratedImage, GeneratedVideo, ImageRequest, MediaStudio, VideoOperation, VideoRequest,
};
pub use polling::PollPolicy;
pub use retry::RetryPolicy;
pub use session::{Session, SessionRegistry, SessionSpec};

/// Stream of text chunks as they arrive from the provider.
pub type TextStream = BoxStream<'static, Result<String, AiError>>;

/// The remote generative-AI service, as seen by the core.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Provider-side session establishment. Fails with
    /// [`AiError::Configuration`] when no credential is available.
    fn establish_session(&self, spec: &SessionSpec) -> Result<(), AiError>;

    /// Start a streaming text generation. The returned stream yields
    /// text chunks in arrival order.
    async fn stream_content(&self, request: ChatRequest) -> Result<TextStream, AiError>;

    /// One-shot image generation.
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, AiError>;

    /// Submit a long-running video generation.
    async fn start_video(&self, request: &VideoRequest) -> Result<VideoOperation, AiError>;

    /// Fetch the current state of a video operation.
    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation, AiError>;
}

/// Shown in place of a model reply when an exchange fails.
pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

pub const NOT_FOUND_MESSAGE: &str = "This model is not available with the current API key. \
     Select a key from a billing-enabled project and try again.";

pub const NOT_CONFIGURED_MESSAGE: &str =
    "No API key is configured. Set GEMINI_API_KEY or add api.api_key to config.toml.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("not configured: {0}")]
    Configuration(String),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("session is busy with another exchange")]
    SessionBusy,
    #[error("cancelled")]
    Cancelled,
}

impl AiError {
    /// Fixed user-facing text for this error class.
    pub fn user_message(&self) -> &'static str {
        match self {
            AiError::Configuration(_) => NOT_CONFIGURED_MESSAGE,
            AiError::NotFound(_) => NOT_FOUND_MESSAGE,
            _ => FAILURE_MESSAGE,
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, AiError::QuotaExceeded(_))
    }
}

impl From<AiError> for muse_common::MuseError {
    fn from(e: AiError) -> Self {
        muse_common::MuseError::Ai(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_distinguishes_remediation_cases() {
        assert_eq!(
            AiError::NotFound("models/x".into()).user_message(),
            NOT_FOUND_MESSAGE
        );
        assert_eq!(
            AiError::Configuration("no key".into()).user_message(),
            NOT_CONFIGURED_MESSAGE
        );
        assert_eq!(
            AiError::Transport("reset".into()).user_message(),
            FAILURE_MESSAGE
        );
        assert_eq!(
            AiError::QuotaExceeded("429".into()).user_message(),
            FAILURE_MESSAGE
        );
    }

    #[test]
    fn only_quota_errors_are_quota() {
        assert!(AiError::QuotaExceeded("x".into()).is_quota());
        assert!(!AiError::Api("x".into()).is_quota());
        assert!(!AiError::Transport("x".into()).is_quota());
    }

    #[test]
    fn converts_into_muse_error() {
        let err: muse_common::MuseError = AiError::Timeout("video".into()).into();
        assert_eq!(err.to_string(), "ai error: timed out: video");
    }
}
