//! File-system adapter for the scratch storage port.

mod settings;
mod temp_file_transport;

pub use settings::{DEFAULT_ASSET_BASE_URL, DEFAULT_READ_CHUNK_BYTES, RuntimeKind, TransportSettings};
pub use temp_file_transport::{TempFileTransport, asset_url};
