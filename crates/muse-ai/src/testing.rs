//! Scriptable in-memory backend for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::media::{GeneratedImage, GeneratedVideo, ImageRequest, VideoOperation, VideoRequest};
use crate::session::SessionSpec;
use crate::{AiError, ChatRequest, GenerativeBackend, TextStream};

/// How one `stream_content` call behaves.
pub(crate) enum StreamScript {
    /// Opening the stream fails.
    OpenError(AiError),
    /// Yield these items, then close.
    Items(Vec<Result<String, AiError>>),
    /// Yield these items, then never produce anything again.
    ItemsThenHang(Vec<Result<String, AiError>>),
}

impl StreamScript {
    pub(crate) fn fragments(fragments: &[&str]) -> Self {
        StreamScript::Items(fragments.iter().map(|f| Ok(f.to_string())).collect())
    }
}

pub(crate) struct FakeBackend {
    configured: bool,
    established: AtomicUsize,
    streams: Mutex<VecDeque<StreamScript>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    images: Mutex<VecDeque<Result<Vec<GeneratedImage>, AiError>>>,
    image_calls: Mutex<Vec<Instant>>,
    polls: Mutex<VecDeque<Result<VideoOperation, AiError>>>,
    poll_calls: Mutex<Vec<Instant>>,
    start_video_result: Mutex<Option<VideoOperation>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            configured: true,
            established: AtomicUsize::new(0),
            streams: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            images: Mutex::new(VecDeque::new()),
            image_calls: Mutex::new(Vec::new()),
            polls: Mutex::new(VecDeque::new()),
            poll_calls: Mutex::new(Vec::new()),
            start_video_result: Mutex::new(None),
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub(crate) fn push_stream(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(script);
    }

    pub(crate) fn push_image_result(&self, result: Result<Vec<GeneratedImage>, AiError>) {
        self.images.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_poll(&self, result: Result<VideoOperation, AiError>) {
        self.polls.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_start_video(&self, op: VideoOperation) {
        *self.start_video_result.lock().unwrap() = Some(op);
    }

    pub(crate) fn sessions_established(&self) -> usize {
        self.established.load(Ordering::SeqCst)
    }

    pub(crate) fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub(crate) fn image_calls(&self) -> Vec<Instant> {
        self.image_calls.lock().unwrap().clone()
    }

    pub(crate) fn poll_calls(&self) -> Vec<Instant> {
        self.poll_calls.lock().unwrap().clone()
    }
}

pub(crate) fn pending_operation(name: &str) -> VideoOperation {
    VideoOperation {
        name: name.to_string(),
        done: false,
        video: None,
        error: None,
    }
}

pub(crate) fn finished_operation(name: &str, uri: &str) -> VideoOperation {
    VideoOperation {
        name: name.to_string(),
        done: true,
        video: Some(GeneratedVideo {
            uri: uri.to_string(),
            mime_type: Some("video/mp4".to_string()),
        }),
        error: None,
    }
}

pub(crate) fn image(data: &str) -> GeneratedImage {
    GeneratedImage {
        mime_type: "image/png".to_string(),
        data: data.to_string(),
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    fn establish_session(&self, _spec: &SessionSpec) -> Result<(), AiError> {
        if !self.configured {
            return Err(AiError::Configuration("no API key configured".into()));
        }
        self.established.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stream_content(&self, request: ChatRequest) -> Result<TextStream, AiError> {
        self.chat_requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::Items(Vec::new()));
        match script {
            StreamScript::OpenError(e) => Err(e),
            StreamScript::Items(items) => Ok(stream::iter(items).boxed()),
            StreamScript::ItemsThenHang(items) => {
                Ok(stream::iter(items).chain(stream::pending()).boxed())
            }
        }
    }

    async fn generate_images(&self, _request: &ImageRequest) -> Result<Vec<GeneratedImage>, AiError> {
        self.image_calls.lock().unwrap().push(Instant::now());
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Api("no scripted image result".into())))
    }

    async fn start_video(&self, _request: &VideoRequest) -> Result<VideoOperation, AiError> {
        Ok(self
            .start_video_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| pending_operation("operations/test")))
    }

    async fn poll_video(&self, _operation: &VideoOperation) -> Result<VideoOperation, AiError> {
        self.poll_calls.lock().unwrap().push(Instant::now());
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending_operation("operations/test")))
    }
}
