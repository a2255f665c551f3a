//! JSON request bodies, response parsing, and error classification for the
//! Gemini REST API.

use serde_json::{json, Value};

use crate::media::{GeneratedImage, GeneratedVideo, ImageRequest, VideoOperation, VideoRequest};
use crate::{AiError, ChatRequest};

/// Longest error body excerpt carried into an `AiError`.
const MAX_ERROR_CHARS: usize = 200;

/// Build the body for `streamGenerateContent`.
pub(crate) fn chat_body(request: &ChatRequest) -> Value {
    let mut body = json!({ "contents": request.contents });
    if !request.system_instruction.trim().is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": request.system_instruction }]
        });
    }
    body
}

/// Build the body for Imagen `predict`.
pub(crate) fn image_body(request: &ImageRequest) -> Value {
    json!({
        "instances": [{ "prompt": request.prompt }],
        "parameters": {
            "sampleCount": request.count.max(1),
            "aspectRatio": request.aspect_ratio,
        }
    })
}

/// Build the body for Veo `predictLongRunning`.
pub(crate) fn video_body(request: &VideoRequest) -> Value {
    let mut instance = json!({ "prompt": request.prompt });
    if let Some(ref image) = request.image {
        instance["image"] = json!({
            "bytesBase64Encoded": image.data,
            "mimeType": image.mime_type,
        });
    }
    json!({
        "instances": [instance],
        "parameters": { "aspectRatio": request.aspect_ratio }
    })
}

/// Extract the text carried by one streamed `GenerateContentResponse`.
///
/// Thought-summary parts are skipped. An `error` object in the payload is
/// classified like an HTTP error.
pub(crate) fn extract_stream_text(data: &str) -> Result<String, AiError> {
    let json: Value =
        serde_json::from_str(data).map_err(|e| AiError::Parse(format!("bad stream event: {e}")))?;

    if let Some(err) = error_from_json(&json) {
        return Err(err);
    }

    let mut chunk = String::new();
    if let Some(candidates) = json["candidates"].as_array() {
        for candidate in candidates {
            if let Some(parts) = candidate["content"]["parts"].as_array() {
                for part in parts {
                    if part["thought"].as_bool() == Some(true) {
                        continue;
                    }
                    if let Some(t) = part["text"].as_str() {
                        chunk.push_str(t);
                    }
                }
            }
        }
    }
    Ok(chunk)
}

/// Parse an Imagen `predict` response.
pub(crate) fn parse_images(json: &Value) -> Result<Vec<GeneratedImage>, AiError> {
    let images: Vec<GeneratedImage> = json["predictions"]
        .as_array()
        .map(|predictions| {
            predictions
                .iter()
                .filter_map(|p| {
                    let data = p["bytesBase64Encoded"].as_str()?;
                    Some(GeneratedImage {
                        mime_type: p["mimeType"].as_str().unwrap_or("image/png").to_string(),
                        data: data.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if images.is_empty() {
        return Err(AiError::Api(
            "no images returned; the prompt may have been blocked".to_string(),
        ));
    }
    Ok(images)
}

/// Parse a long-running operation resource.
pub(crate) fn parse_operation(json: &Value) -> Result<VideoOperation, AiError> {
    let name = json["name"]
        .as_str()
        .ok_or_else(|| AiError::Parse("operation has no name".to_string()))?
        .to_string();
    let done = json["done"].as_bool().unwrap_or(false);

    let error = json
        .get("error")
        .map(|e| e["message"].as_str().unwrap_or("operation failed").to_string());

    let video = json["response"]["generateVideoResponse"]["generatedSamples"]
        .as_array()
        .and_then(|samples| samples.first())
        .and_then(|sample| {
            let uri = sample["video"]["uri"].as_str()?;
            Some(GeneratedVideo {
                uri: uri.to_string(),
                mime_type: sample["video"]["mimeType"].as_str().map(String::from),
            })
        });

    Ok(VideoOperation {
        name,
        done,
        video,
        error,
    })
}

/// Map an HTTP failure to the error taxonomy.
///
/// 429 / `RESOURCE_EXHAUSTED` is quota exhaustion; 404 / `NOT_FOUND` means
/// the model or feature is unavailable for this key.
pub fn classify_error(status: u16, body: &str) -> AiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let (status_text, message) = match parsed.as_ref().and_then(|v| v.get("error")) {
        Some(err) => (
            err["status"].as_str().unwrap_or("").to_string(),
            err["message"].as_str().unwrap_or(body).to_string(),
        ),
        None => (String::new(), body.to_string()),
    };
    classify(status, &status_text, &message)
}

fn error_from_json(json: &Value) -> Option<AiError> {
    let err = json.get("error")?;
    let code = err["code"].as_u64().unwrap_or(0) as u16;
    let status_text = err["status"].as_str().unwrap_or("");
    let message = err["message"].as_str().unwrap_or("stream error");
    Some(classify(code, status_text, message))
}

fn classify(status: u16, status_text: &str, message: &str) -> AiError {
    let excerpt: String = message.chars().take(MAX_ERROR_CHARS).collect();

    if status == 429 || status_text == "RESOURCE_EXHAUSTED" {
        return AiError::QuotaExceeded(excerpt);
    }
    if status == 404
        || status_text == "NOT_FOUND"
        || message.contains("Requested entity was not found")
    {
        return AiError::NotFound(excerpt);
    }
    if status_text.is_empty() {
        AiError::Api(format!("HTTP {status}: {excerpt}"))
    } else {
        AiError::Api(format!("HTTP {status} {status_text}: {excerpt}"))
    }
}
