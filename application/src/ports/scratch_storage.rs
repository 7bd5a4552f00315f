//! Port for scratch files handed to the native side by path.
//!
//! Large payloads never cross the invoke bridge inline: they are written to
//! a temporary file and the native command receives the path. Reads go the
//! other way, through an asset stream opened on a native file path.

use crate::http::{ByteStream, FetchError};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no writable scratch directory (tried: {tried})")]
    NoScratchDir { tried: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset fetch for {path} failed: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: FetchError,
    },

    #[error("asset fetch for {path} returned HTTP {status}")]
    AssetStatus { path: PathBuf, status: u16 },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            StorageError::AssetStatus { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// How to name a scratch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempFileOptions {
    pub prefix: String,
    /// Without the leading dot.
    pub extension: String,
}

impl Default for TempFileOptions {
    fn default() -> Self {
        Self {
            prefix: "hearth".to_string(),
            extension: "jsonl".to_string(),
        }
    }
}

impl TempFileOptions {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }
}

#[async_trait]
pub trait ScratchStorage: Send + Sync {
    /// Write `chunks` in order to a fresh file and return its path.
    ///
    /// The file exists afterwards even when there were no chunks.
    async fn write_temp_file(
        &self,
        chunks: &mut (dyn Iterator<Item = Bytes> + Send),
        options: &TempFileOptions,
    ) -> Result<PathBuf, StorageError>;

    /// Delete a file. A missing file is not an error.
    async fn remove_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Stream the bytes of a native file.
    async fn open_asset_stream(&self, path: &Path) -> Result<ByteStream, StorageError>;
}
