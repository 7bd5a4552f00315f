//! Moving chat payloads between clients and native storage.

pub mod jsonl_stream;
pub mod temp_file;

pub use jsonl_stream::{StreamDecodeError, decode_stream};
pub use temp_file::{TempFileError, TempFileHandle, with_temp_file};
