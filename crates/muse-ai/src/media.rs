//! One-shot image generation and long-running video generation.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use muse_config::MuseConfig;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::content::InlineData;
use crate::polling::PollPolicy;
use crate::retry::RetryPolicy;
use crate::{AiError, GenerativeBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: String,
    pub count: u32,
}

/// A generated image as returned by the provider (base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn decode(&self) -> Result<Vec<u8>, AiError> {
        BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| AiError::Parse(format!("invalid image data: {e}")))
    }

    /// `data:` URI for embedding.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub model: String,
    pub aspect_ratio: String,
    /// Optional starting frame.
    pub image: Option<InlineData>,
}

/// State of a long-running video operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOperation {
    pub name: String,
    pub done: bool,
    pub video: Option<GeneratedVideo>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    /// Download location; fetching it requires the API key.
    pub uri: String,
    pub mime_type: Option<String>,
}

/// Image and video generation with the configured retry and poll policies.
pub struct MediaStudio {
    backend: Arc<dyn GenerativeBackend>,
    retry: RetryPolicy,
    poll: PollPolicy,
    image_model: String,
    image_aspect_ratio: String,
    video_model: String,
    video_aspect_ratio: String,
}

impl MediaStudio {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &MuseConfig) -> Self {
        Self {
            backend,
            retry: RetryPolicy::from(&config.retry),
            poll: PollPolicy::from(&config.video),
            image_model: config.image.model.clone(),
            image_aspect_ratio: config.image.aspect_ratio.clone(),
            video_model: config.video.model.clone(),
            video_aspect_ratio: config.video.aspect_ratio.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Request for `prompt` with the configured model and aspect ratio.
    pub fn image_request(&self, prompt: &str, count: u32) -> ImageRequest {
        ImageRequest {
            prompt: prompt.to_string(),
            model: self.image_model.clone(),
            aspect_ratio: self.image_aspect_ratio.clone(),
            count,
        }
    }

    pub fn video_request(&self, prompt: &str, image: Option<InlineData>) -> VideoRequest {
        VideoRequest {
            prompt: prompt.to_string(),
            model: self.video_model.clone(),
            aspect_ratio: self.video_aspect_ratio.clone(),
            image,
        }
    }

    /// Generate images, retrying on quota exhaustion.
    pub async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, AiError> {
        let images = self
            .retry
            .run(|| self.backend.generate_images(request))
            .await?;
        info!(model = %request.model, count = images.len(), "Images generated");
        Ok(images)
    }

    /// Submit a video generation and poll until it finishes.
    ///
    /// The result is taken from the first poll response marked done.
    pub async fn generate_video(
        &self,
        request: &VideoRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<GeneratedVideo, AiError> {
        let operation = self.backend.start_video(request).await?;
        info!(model = %request.model, operation = %operation.name, "Video generation started");

        let finished = if operation.done {
            operation
        } else {
            let backend = &self.backend;
            let operation = &operation;
            self.poll
                .run(cancel, || async move {
                    let current = backend.poll_video(operation).await?;
                    Ok(current.done.then_some(current))
                })
                .await?
        };

        extract_video(finished)
    }
}

fn extract_video(operation: VideoOperation) -> Result<GeneratedVideo, AiError> {
    if let Some(error) = operation.error {
        return Err(AiError::Api(format!(
            "video operation {} failed: {error}",
            operation.name
        )));
    }
    let video = operation.video.ok_or_else(|| {
        AiError::Api(format!(
            "video operation {} finished without a video",
            operation.name
        ))
    })?;
    debug!(operation = %operation.name, uri = %video.uri, "Video ready");
    Ok(video)
}
