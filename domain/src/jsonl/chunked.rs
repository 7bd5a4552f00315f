//! Bounded-size byte chunking of a chat payload.

use super::codec::validate_payload;
use super::error::{JsonlError, Result};
use serde_json::Value;

/// Lazily yields JSONL byte chunks of at most `max_chunk_bytes` each.
///
/// Each record is appended together with the `\n` separator that precedes
/// it. A chunk is emitted only between records, so a record is never split
/// across chunks; a single record larger than the limit becomes a chunk of
/// its own. Concatenating every chunk reproduces [`encode`](super::encode)
/// byte for byte.
#[derive(Debug)]
pub struct ChunkedEncoder<'a> {
    records: std::slice::Iter<'a, Value>,
    max_chunk_bytes: usize,
    buffer: Vec<u8>,
    first: bool,
}

/// Start chunking `payload`. The payload shape is validated up front so the
/// iterator itself cannot fail midway through a write.
pub fn encode_chunked(payload: &[Value], max_chunk_bytes: usize) -> Result<ChunkedEncoder<'_>> {
    if max_chunk_bytes == 0 {
        return Err(JsonlError::ZeroChunkSize);
    }
    validate_payload(payload)?;
    Ok(ChunkedEncoder {
        records: payload.iter(),
        max_chunk_bytes,
        buffer: Vec::new(),
        first: true,
    })
}

impl Iterator for ChunkedEncoder<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.records.by_ref() {
            let mut piece = Vec::new();
            if !self.first {
                piece.push(b'\n');
            }
            self.first = false;
            piece.extend_from_slice(record.to_string().as_bytes());

            if !self.buffer.is_empty() && self.buffer.len() + piece.len() > self.max_chunk_bytes {
                let ready = std::mem::replace(&mut self.buffer, piece);
                return Some(ready);
            }
            self.buffer.extend_from_slice(&piece);
        }

        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}
