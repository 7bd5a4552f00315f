//! Server-sent-event framing and provider-shaped error frames.

use super::source::{CompletionSource, WireFormat};
use crate::core::string::strip_prefix_ignore_ascii_case;
use serde_json::{Value, json};

/// Literal payload marking the end of a streamed completion.
pub const STREAM_TERMINATOR: &str = "[DONE]";

/// Label every synthesized error message starts with.
pub const ERROR_LABEL: &str = "Chat completion error: ";

/// Upstream prefixes removed before labelling.
const UPSTREAM_PREFIXES: &[&str] = &[
    "internal server error:",
    "validation error:",
    "bad request:",
    "invalid request:",
    "error:",
];

/// Format one SSE data frame.
pub fn sse_frame(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

/// The frame closing every non-cancelled stream.
pub fn terminator_frame() -> String {
    sse_frame(STREAM_TERMINATOR)
}

/// Whether a chunk payload is the stream terminator.
pub fn is_terminator(payload: &str) -> bool {
    payload.trim() == STREAM_TERMINATOR
}

/// Strip known upstream prefixes until none remain, then add
/// [`ERROR_LABEL`] unless it is already there.
pub fn format_error_text(raw: &str) -> String {
    let mut text = raw.trim();
    'strip: loop {
        for prefix in UPSTREAM_PREFIXES {
            if let Some(rest) = strip_prefix_ignore_ascii_case(text, prefix) {
                text = rest.trim_start();
                continue 'strip;
            }
        }
        break;
    }

    let text = if text.is_empty() { "Unknown error" } else { text };
    if strip_prefix_ignore_ascii_case(text, ERROR_LABEL.trim_end()).is_some() {
        text.to_string()
    } else {
        format!("{ERROR_LABEL}{text}")
    }
}

/// In-band streaming error payload in the shape the source's parser expects.
pub fn stream_error_payload(source: &CompletionSource, message: &str) -> Value {
    let text = format_error_text(message);
    match source.wire_format() {
        WireFormat::Anthropic => json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": text },
        }),
        WireFormat::Google => json!({
            "candidates": [{
                "index": 0,
                "content": { "role": "model", "parts": [{ "text": text }] },
            }],
        }),
        WireFormat::Cohere => json!({
            "type": "content-delta",
            "index": 0,
            "delta": { "message": { "content": { "text": text } } },
        }),
        WireFormat::OpenAi => json!({
            "object": "chat.completion.chunk",
            "model": source.as_str(),
            "choices": [{
                "index": 0,
                "delta": { "role": "assistant", "content": text },
                "finish_reason": "stop",
            }],
        }),
    }
}

/// The SSE frame carrying [`stream_error_payload`].
pub fn stream_error_frame(source: &CompletionSource, message: &str) -> String {
    sse_frame(&stream_error_payload(source, message).to_string())
}

/// A complete `chat.completion` object carrying the error as the assistant
/// message, for non-streaming requests.
pub fn completion_error_body(source: &CompletionSource, message: &str) -> Value {
    json!({
        "object": "chat.completion",
        "model": source.as_str(),
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": format_error_text(message) },
            "finish_reason": "stop",
        }],
    })
}
