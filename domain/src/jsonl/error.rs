//! JSONL codec errors

use thiserror::Error;

/// Result type alias for JSONL operations
pub type Result<T> = std::result::Result<T, JsonlError>;

/// Errors raised while encoding or decoding chat payloads
#[derive(Error, Debug)]
pub enum JsonlError {
    #[error("chat payload must be an array of JSON objects")]
    PayloadNotArray,

    #[error("chat payload element {index} is not a JSON object")]
    InvalidPayloadShape { index: usize },

    #[error("invalid JSONL at line {line}: {source}")]
    InvalidJsonlLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSONL line {line} is not a JSON object")]
    InvalidJsonlRecord { line: usize },

    #[error("chunk size limit must be greater than zero")]
    ZeroChunkSize,
}

impl JsonlError {
    /// 1-indexed line number for decode failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            JsonlError::InvalidJsonlLine { line, .. } | JsonlError::InvalidJsonlRecord { line } => {
                Some(*line)
            }
            _ => None,
        }
    }
}
