//! Frame translation in both relay directions.
//!
//! Client to upstream, binary audio is wrapped in a `realtime_input` message
//! and text is forwarded only when it carries an allow-listed top-level key.
//!
//! Upstream to client, frames arrive binary but may hold JSON. A frame is
//! treated as text when it is valid UTF-8, its trimmed content starts with
//! `{`, and it parses as JSON. Binary audio that happens to satisfy all three
//! is misclassified; upstream offers no framing that would tell them apart.

use crate::frame::Frame;
use base64::prelude::*;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

/// MIME type of client microphone audio: PCM16 mono at 16 kHz.
pub const INPUT_AUDIO_MIME: &str = "audio/pcm;rate=16000";

/// Top-level keys a client text frame must carry to be forwarded upstream.
pub const FORWARDED_KEYS: &[&str] = &["realtime_input", "client_content"];

#[derive(Debug, Serialize)]
struct RealtimeInputMessage<'a> {
    realtime_input: RealtimeInput<'a>,
}

#[derive(Debug, Serialize)]
struct RealtimeInput<'a> {
    media_chunks: [MediaChunk<'a>; 1],
}

#[derive(Debug, Serialize)]
struct MediaChunk<'a> {
    mime_type: &'a str,
    data: String,
}

/// Wrap raw PCM from the client as one upstream `realtime_input` message.
pub fn encode_audio_chunk(pcm: &[u8]) -> String {
    let message = RealtimeInputMessage {
        realtime_input: RealtimeInput {
            media_chunks: [MediaChunk { mime_type: INPUT_AUDIO_MIME, data: BASE64_STANDARD.encode(pcm) }],
        },
    };
    // Only strings and fixed arrays; serialization cannot fail.
    serde_json::to_string(&message).unwrap_or_default()
}

/// Whether a client text frame may be forwarded upstream as-is.
pub fn is_forwardable_text(text: &str) -> bool {
    serde_json::from_str::<Map<String, Value>>(text)
        .map(|object| FORWARDED_KEYS.iter().any(|key| object.contains_key(*key)))
        .unwrap_or(false)
}

/// Upstream-bound frame for a client frame, or `None` if it is dropped.
pub fn client_frame_to_upstream(frame: Frame) -> Option<Frame> {
    match frame {
        Frame::Binary(pcm) => Some(Frame::Text(encode_audio_chunk(&pcm))),
        Frame::Text(text) if is_forwardable_text(&text) => Some(Frame::Text(text)),
        Frame::Text(_) => None,
    }
}

/// Classify a binary upstream frame as JSON text or audio.
pub fn classify_upstream(bytes: Bytes) -> Frame {
    if let Ok(text) = std::str::from_utf8(&bytes) {
        if text.trim_start().starts_with('{') && serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok() {
            return Frame::Text(text.to_owned());
        }
    }
    Frame::Binary(bytes)
}

/// Client-bound frame for an upstream frame.
pub fn upstream_frame_to_client(frame: Frame) -> Frame {
    match frame {
        Frame::Binary(bytes) => classify_upstream(bytes),
        text @ Frame::Text(_) => text,
    }
}
