//! Media payload handling: extraction from upstream JSON, MIME detection for
//! reference images, and Markdown wrapping of base64 results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MIME type assumed for video payloads without a sibling `mimeType`.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// MIME type requested from, and assumed for, image predictions.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// MIME type assumed for reference images that cannot be sniffed.
pub const DEFAULT_REFERENCE_MIME: &str = "image/png";

/// Nesting depth beyond which the video search gives up.
pub const MAX_SEARCH_DEPTH: usize = 32;

/// Keys whose string value is taken as the video payload, in priority order.
const VIDEO_KEYS: &[&str] = &["video", "bytesBase64Encoded"];

/// Base64 media data with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
    pub data: String,
    pub mime_type: String,
}

impl MediaPayload {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self { data: data.into(), mime_type: mime_type.into() }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Inline Markdown image.
    pub fn to_markdown_image(&self) -> String {
        format!("![Generated image]({})", self.data_uri())
    }

    /// Markdown download link.
    pub fn to_markdown_download(&self) -> String {
        format!("[Download video]({})", self.data_uri())
    }
}

/// Depth-first search for the first video payload in an operation response.
///
/// At each object the `video`/`bytesBase64Encoded` keys are checked first,
/// then array children, then object children.
pub fn find_video_payload(value: &Value) -> Option<MediaPayload> {
    search(value, 0)
}

fn search(value: &Value, depth: usize) -> Option<MediaPayload> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            for key in VIDEO_KEYS {
                if let Some(Value::String(data)) = map.get(*key) {
                    let mime_type =
                        map.get("mimeType").and_then(Value::as_str).unwrap_or(DEFAULT_VIDEO_MIME);
                    return Some(MediaPayload::new(data.clone(), mime_type));
                }
            }
            map.values()
                .filter(|v| v.is_array())
                .chain(map.values().filter(|v| v.is_object()))
                .find_map(|child| search(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|item| search(item, depth + 1)),
        _ => None,
    }
}

/// Image data from the first prediction of a `predict` response.
///
/// The prediction is either an object carrying `bytesBase64Encoded` or, in
/// older schema versions, the bare base64 string.
pub fn extract_image_prediction(response: &Value) -> Option<MediaPayload> {
    let first = response.get("predictions")?.as_array()?.first()?;
    match first {
        Value::String(data) => Some(MediaPayload::new(data.clone(), DEFAULT_IMAGE_MIME)),
        Value::Object(map) => {
            let data = map.get("bytesBase64Encoded")?.as_str()?;
            let mime_type =
                map.get("mimeType").and_then(Value::as_str).unwrap_or(DEFAULT_IMAGE_MIME);
            Some(MediaPayload::new(data, mime_type))
        }
        _ => None,
    }
}

/// A reference image supplied by the client for video generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl ReferenceImage {
    /// Accepts either a `data:<mime>;base64,<data>` URI or raw base64.
    pub fn from_client(input: &str) -> Self {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("data:") {
            if let Some((header, data)) = rest.split_once(',') {
                let mime = header.split(';').next().filter(|m| !m.is_empty());
                return Self {
                    bytes_base64_encoded: data.to_string(),
                    mime_type: mime
                        .map(str::to_string)
                        .unwrap_or_else(|| sniff_image_mime(data).to_string()),
                };
            }
        }
        Self { bytes_base64_encoded: input.to_string(), mime_type: sniff_image_mime(input).to_string() }
    }
}

/// Guess an image MIME type from the leading base64 characters.
pub fn sniff_image_mime(base64: &str) -> &'static str {
    if base64.starts_with("/9j/") {
        "image/jpeg"
    } else if base64.starts_with("iVBOR") {
        "image/png"
    } else if base64.starts_with("R0lGOD") {
        "image/gif"
    } else if base64.starts_with("UklGR") {
        "image/webp"
    } else {
        DEFAULT_REFERENCE_MIME
    }
}
