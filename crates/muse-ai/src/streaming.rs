//! Server-Sent Events (SSE) streaming parser.
//!
//! Gemini's `streamGenerateContent?alt=sse` endpoint answers with an SSE
//! body where each event's data is one partial `GenerateContentResponse`.
//! The parser is lazy: nothing is read until the returned stream is polled,
//! and dropping the stream drops the underlying response body.

use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data (JSON string). Multi-line data is joined with `\n`.
    pub data: String,
}

/// Parse the SSE body of a reqwest response.
pub fn sse_events(
    response: reqwest::Response,
) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    sse_events_from_reader(reader)
}

/// Parse SSE events from any buffered async reader.
pub fn sse_events_from_reader<R>(
    reader: R,
) -> impl Stream<Item = Result<SseEvent, AiError>> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async_stream::try_stream! {
        let mut lines = reader.lines();
        let mut current_event: Option<String> = None;
        let mut current_data = String::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?
        {
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                // Empty line = end of event
                if !current_data.is_empty() {
                    yield SseEvent {
                        event: current_event.take(),
                        data: std::mem::take(&mut current_data),
                    };
                }
                current_event = None;
                continue;
            }

            if let Some(event_type) = field_value(line, "event") {
                current_event = Some(event_type.to_string());
            } else if let Some(data) = field_value(line, "data") {
                if !current_data.is_empty() {
                    current_data.push('\n');
                }
                current_data.push_str(data);
            }
            // Ignore other fields (id:, retry:, comments)
        }

        // Flush any remaining event
        if !current_data.is_empty() {
            yield SseEvent {
                event: current_event,
                data: current_data,
            };
        }
    }
}

/// `name: value` or `name:value`.
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
