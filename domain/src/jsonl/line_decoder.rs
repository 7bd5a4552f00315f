//! Incremental JSONL decoding over arbitrary byte chunks.

use super::codec::{JsonObject, LineState};
use super::error::Result;

/// Push-based JSONL decoder.
///
/// Bytes are buffered until a `\n` arrives, so multi-byte UTF-8 sequences
/// split across chunk boundaries are reassembled before decoding (`\n` never
/// occurs inside a multi-byte sequence). Line rules match
/// [`decode`](super::decode), including the fail-fast policy.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
    state: LineState,
    records: Vec<JsonObject>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of bytes, decoding every completed line.
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        let mut start = 0;
        for (offset, byte) in chunk.iter().enumerate() {
            if *byte != b'\n' {
                continue;
            }
            self.pending.extend_from_slice(&chunk[start..offset]);
            let line = std::mem::take(&mut self.pending);
            self.parse(&line)?;
            start = offset + 1;
        }
        self.pending.extend_from_slice(&chunk[start..]);
        Ok(())
    }

    /// Decode the trailing partial line (if any) and return every record.
    pub fn finish(mut self) -> Result<Vec<JsonObject>> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.parse(&line)?;
        }
        Ok(self.records)
    }

    /// Records decoded so far.
    pub fn records(&self) -> &[JsonObject] {
        &self.records
    }

    fn parse(&mut self, line: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(line);
        if let Some(record) = self.state.parse_line(&text)? {
            self.records.push(record);
        }
        Ok(())
    }
}
