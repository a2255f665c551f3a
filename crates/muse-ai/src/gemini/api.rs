//! GenerativeBackend trait implementation for GeminiClient.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::media::{GeneratedImage, ImageRequest, VideoOperation, VideoRequest};
use crate::session::SessionSpec;
use crate::streaming::sse_events;
use crate::{AiError, ChatRequest, GenerativeBackend, TextStream};

use super::client::GeminiClient;
use super::wire::{chat_body, extract_stream_text, image_body, parse_images, parse_operation, video_body};

#[async_trait]
impl GenerativeBackend for GeminiClient {
    fn establish_session(&self, spec: &SessionSpec) -> Result<(), AiError> {
        // REST sessions are stateless on the server; establishing one only
        // requires a usable credential.
        self.api_key()?;
        debug!(model = %spec.model, "Gemini session established");
        Ok(())
    }

    async fn stream_content(&self, request: ChatRequest) -> Result<TextStream, AiError> {
        let body = chat_body(&request);
        let url = self.chat_url(request.model);

        debug!(
            model = %request.model,
            turns = request.contents.len(),
            "Gemini API streaming request"
        );

        let response = self.post(&url, &body).await?;

        let fragments = sse_events(response).filter_map(|event| async move {
            match event.and_then(|e| extract_stream_text(&e.data)) {
                Ok(text) if text.is_empty() => None,
                other => Some(other),
            }
        });

        Ok(fragments.boxed())
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, AiError> {
        let url = self.model_url(&request.model, "predict");
        debug!(model = %request.model, count = request.count, "Imagen request");

        let json: serde_json::Value = self
            .post(&url, &image_body(request))
            .await?
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        parse_images(&json)
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<VideoOperation, AiError> {
        let url = self.model_url(&request.model, "predictLongRunning");
        debug!(model = %request.model, "Veo generation request");

        let json: serde_json::Value = self
            .post(&url, &video_body(request))
            .await?
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        parse_operation(&json)
    }

    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation, AiError> {
        let json = self.get_json(&self.operation_url(&operation.name)).await?;
        parse_operation(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, Part};
    use crate::gemini::GeminiConfig;
    use muse_common::ModelVariant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one HTTP response on a local port. The handle yields the raw
    /// request the client sent.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient {
            config: GeminiConfig::new("test-key").with_base_url(base_url),
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: ModelVariant::Flash,
            system_instruction: "be brief".into(),
            contents: vec![Content::user(vec![Part::text("hello")])],
        }
    }

    fn text_event(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
        )
    }

    #[tokio::test]
    async fn streams_text_fragments_and_drops_empty_events() {
        let body = [
            text_event("Hi"),
            "data: {\"usageMetadata\":{\"totalTokenCount\":3}}\r\n\r\n".to_string(),
            text_event(" there"),
        ]
        .concat();
        let (base_url, server) = serve_once("200 OK", body).await;

        let stream = client(&base_url).stream_content(request()).await.unwrap();
        let fragments: Vec<Result<String, AiError>> = stream.collect().await;
        assert_eq!(fragments, vec![Ok("Hi".to_string()), Ok(" there".to_string())]);

        let sent = server.await.unwrap();
        assert!(sent.starts_with(
            "POST /v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse HTTP/1.1"
        ));
        let lowered = sent.to_ascii_lowercase();
        assert!(lowered.contains("x-goog-api-key: test-key"));
        assert!(sent.contains("\"systemInstruction\""));
        assert!(sent.contains("\"hello\""));
    }

    #[tokio::test]
    async fn error_status_fails_before_streaming() {
        let body = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED","message":"slow down"}}"#;
        let (base_url, server) = serve_once("429 Too Many Requests", body.to_string()).await;

        let result = client(&base_url).stream_content(request()).await;
        let Err(err) = result else {
            panic!("expected an error status to fail the request");
        };
        assert_eq!(err, AiError::QuotaExceeded("slow down".into()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_object_mid_stream_is_yielded_after_earlier_text() {
        let body = [
            text_event("partial"),
            "data: {\"error\":{\"code\":500,\"status\":\"INTERNAL\",\"message\":\"backend died\"}}\r\n\r\n"
                .to_string(),
        ]
        .concat();
        let (base_url, server) = serve_once("200 OK", body).await;

        let mut stream = client(&base_url).stream_content(request()).await.unwrap();
        assert_eq!(stream.next().await, Some(Ok("partial".to_string())));
        assert_eq!(
            stream.next().await,
            Some(Err(AiError::Api("HTTP 500 INTERNAL: backend died".into())))
        );
        server.await.unwrap();
    }
}
