//! Infrastructure layer for hearth
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the in-process invoke bridge, the file-system
//! scratch storage, the network HTTP client, configuration file loading
//! and transcript logging.

pub mod config;
pub mod invoke;
pub mod logging;
pub mod network;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigSource, ConfigValidationError, FileConfig};
pub use invoke::{EventEmitter, LocalInvokeBridge};
pub use logging::JsonlTranscriptLogger;
pub use network::ReqwestHttpClient;
pub use storage::{RuntimeKind, TempFileTransport, TransportSettings};
