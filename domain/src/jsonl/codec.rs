//! Whole-payload JSONL encoding and decoding.
//!
//! Malformed input is rejected fail-fast: the first line that does not parse
//! as a JSON object aborts decoding with its 1-indexed line number. The same
//! policy is used by [`LineDecoder`](super::LineDecoder), so a file decodes
//! identically whether it arrives as a string or as a byte stream.

use super::error::{JsonlError, Result};
use serde_json::{Map, Value};

/// A single JSONL record. Chat payloads are sequences of these.
pub type JsonObject = Map<String, Value>;

const BOM: char = '\u{feff}';

/// Serialize a chat payload as JSONL, one record per line joined by `\n`.
///
/// Fails with [`JsonlError::InvalidPayloadShape`] if any element is not a
/// JSON object.
pub fn encode(payload: &[Value]) -> Result<String> {
    validate_payload(payload)?;
    let lines: Vec<String> = payload.iter().map(Value::to_string).collect();
    Ok(lines.join("\n"))
}

/// Like [`encode`], but accepts an arbitrary JSON value and rejects anything
/// that is not an array.
pub fn encode_value(payload: &Value) -> Result<String> {
    match payload {
        Value::Array(items) => encode(items),
        _ => Err(JsonlError::PayloadNotArray),
    }
}

/// Check that every element of the payload is a JSON object.
pub fn validate_payload(payload: &[Value]) -> Result<()> {
    match payload.iter().position(|v| !v.is_object()) {
        Some(index) => Err(JsonlError::InvalidPayloadShape { index }),
        None => Ok(()),
    }
}

/// Parse JSONL text into records.
///
/// Lines are split on `\r?\n` and trimmed; blank lines are skipped; a
/// byte-order mark is stripped from the first non-blank line only.
pub fn decode(text: &str) -> Result<Vec<JsonObject>> {
    let mut state = LineState::default();
    let mut records = Vec::new();
    for raw in text.split('\n') {
        if let Some(record) = state.parse_line(raw)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Per-document line bookkeeping shared by the string and stream decoders.
#[derive(Debug, Default)]
pub(crate) struct LineState {
    line_no: usize,
    seen_content: bool,
}

impl LineState {
    /// Parse one physical line (without its `\n`). Returns `None` for
    /// blank lines.
    pub(crate) fn parse_line(&mut self, raw: &str) -> Result<Option<JsonObject>> {
        self.line_no += 1;
        let mut line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if !self.seen_content {
            self.seen_content = true;
            line = line.strip_prefix(BOM).unwrap_or(line).trim_start();
            if line.is_empty() {
                return Ok(None);
            }
        }

        let value: Value = serde_json::from_str(line).map_err(|source| {
            JsonlError::InvalidJsonlLine {
                line: self.line_no,
                source,
            }
        })?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(JsonlError::InvalidJsonlRecord { line: self.line_no }),
        }
    }
}
