//! JSONL codec for chat payloads.
//!
//! - [`encode`] / [`decode`]: whole-payload conversion
//! - [`encode_chunked`]: bounded byte chunks for temp-file materialization
//! - [`LineDecoder`]: incremental decoding of a byte stream
//!
//! All decoders share one malformed-line policy: fail fast with the
//! 1-indexed line number.

mod chunked;
mod codec;
mod error;
mod line_decoder;

pub use chunked::{ChunkedEncoder, encode_chunked};
pub use codec::{JsonObject, decode, encode, encode_value, validate_payload};
pub use error::{JsonlError, Result};
pub use line_decoder::LineDecoder;
