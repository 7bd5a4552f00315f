//! Incremental JSONL decoding of byte streams.

use crate::http::ByteStream;
use futures::StreamExt;
use hearth_domain::jsonl::{JsonObject, JsonlError, LineDecoder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamDecodeError {
    #[error("failed to read stream: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Jsonl(#[from] JsonlError),
}

/// Decode a JSONL byte stream into records.
///
/// Fails fast: the first unreadable chunk or malformed line stops the read,
/// and the stream is dropped (cancelling its source) before returning.
pub async fn decode_stream(mut stream: ByteStream) -> Result<Vec<JsonObject>, StreamDecodeError> {
    let mut decoder = LineDecoder::new();
    while let Some(chunk) = stream.next().await {
        let pushed = match chunk {
            Ok(bytes) => decoder.push(&bytes).map_err(StreamDecodeError::from),
            Err(e) => Err(StreamDecodeError::Read(e)),
        };
        if let Err(e) = pushed {
            drop(stream);
            return Err(e);
        }
    }
    Ok(decoder.finish()?)
}
