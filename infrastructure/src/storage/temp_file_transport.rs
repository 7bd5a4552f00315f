//! Scratch files on the local file system.
//!
//! Payloads are written chunk by chunk the way a native file API is
//! driven: the first chunk creates the file, every later chunk reopens it
//! in append mode. Native files are read back either in bounded pieces
//! (sandboxed runtimes) or through the host's asset URL (desktop).

use super::settings::{RuntimeKind, TransportSettings};
use async_trait::async_trait;
use bytes::Bytes;
use hearth_application::http::{ByteStream, FetchRequest};
use hearth_application::ports::http_client::HttpClient;
use hearth_application::ports::scratch_storage::{ScratchStorage, StorageError, TempFileOptions};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace, warn};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const NAME_ATTEMPTS: usize = 3;

pub struct TempFileTransport {
    settings: TransportSettings,
    /// Desktop asset reads go through this client.
    http: Option<Arc<dyn HttpClient>>,
    counter: AtomicU64,
}

impl TempFileTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            settings,
            http: None,
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// First scratch directory that exists or can be created.
    pub async fn scratch_dir(&self) -> Result<PathBuf, StorageError> {
        let candidates = self.settings.scratch_candidates();
        for dir in &candidates {
            match fs::create_dir_all(dir).await {
                Ok(()) => return Ok(dir.clone()),
                Err(e) => debug!("Scratch dir {} unusable: {}", dir.display(), e),
            }
        }
        let tried = candidates
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(StorageError::NoScratchDir { tried })
    }

    /// `prefix-<unix millis>-<random hex>.ext`
    fn file_name(&self, options: &TempFileOptions) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u128(millis);
        hasher.write_u64(self.counter.fetch_add(1, Ordering::Relaxed));
        format!(
            "{}-{}-{:016x}.{}",
            options.prefix,
            millis,
            hasher.finish(),
            options.extension
        )
    }

    async fn create_file(
        &self,
        dir: &Path,
        options: &TempFileOptions,
    ) -> Result<(PathBuf, fs::File), StorageError> {
        let mut last_error = None;
        for _ in 0..NAME_ATTEMPTS {
            let path = dir.join(self.file_name(options));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    last_error = Some(StorageError::io(&path, e));
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        Err(last_error.unwrap_or_else(|| StorageError::NoScratchDir {
            tried: dir.display().to_string(),
        }))
    }

    async fn write_chunks(
        &self,
        path: &Path,
        first: fs::File,
        chunks: &mut (dyn Iterator<Item = Bytes> + Send),
    ) -> Result<(), StorageError> {
        let mut file = Some(first);
        for (index, chunk) in chunks.enumerate() {
            let mut handle = match file.take() {
                Some(handle) => handle,
                None => OpenOptions::new()
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| StorageError::io(path, e))?,
            };
            handle
                .write_all(&chunk)
                .await
                .map_err(|e| StorageError::io(path, e))?;
            handle.flush().await.map_err(|e| StorageError::io(path, e))?;
            trace!("Wrote chunk {} ({} bytes) to {}", index, chunk.len(), path.display());
        }
        Ok(())
    }

    async fn read_local(&self, path: &Path) -> Result<ByteStream, StorageError> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        Ok(bounded_reads(file, self.settings.read_chunk_bytes.max(1)))
    }

    async fn read_via_asset_url(&self, path: &Path) -> Result<ByteStream, StorageError> {
        let Some(http) = &self.http else {
            return self.read_local(path).await;
        };
        let url = asset_url(&self.settings.asset_base_url, path);
        debug!("Fetching asset {}", url);
        let response = http
            .fetch(FetchRequest::get(url))
            .await
            .map_err(|source| StorageError::Asset {
                path: path.to_path_buf(),
                source,
            })?;
        if !response.ok() {
            return Err(StorageError::AssetStatus {
                path: path.to_path_buf(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.into_stream())
    }
}

/// `<base>/<percent-encoded path>`, as the host converts file paths.
pub fn asset_url(base: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(&path, URI_COMPONENT)
    )
}

/// Pull-based stream of reads of at most `read_size` bytes. A zero-length
/// read ends it; the file is closed at the end, on error, or on drop.
fn bounded_reads(file: fs::File, read_size: usize) -> ByteStream {
    let stream = futures::stream::unfold(Some(file), move |state| async move {
        let mut file = state?;
        let mut buf = vec![0u8; read_size];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some(file)))
            }
            Err(e) => Some((Err(e), None)),
        }
    });
    Box::pin(stream)
}

#[async_trait]
impl ScratchStorage for TempFileTransport {
    async fn write_temp_file(
        &self,
        chunks: &mut (dyn Iterator<Item = Bytes> + Send),
        options: &TempFileOptions,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.scratch_dir().await?;
        let (path, file) = self.create_file(&dir, options).await?;
        if let Err(e) = self.write_chunks(&path, file, chunks).await {
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!("Could not remove partial temp file {}: {}", path.display(), cleanup);
            }
            return Err(e);
        }
        debug!("Materialized temp file {}", path.display());
        Ok(path)
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn open_asset_stream(&self, path: &Path) -> Result<ByteStream, StorageError> {
        match self.settings.runtime.resolve() {
            RuntimeKind::Sandboxed => self.read_local(path).await,
            _ => self.read_via_asset_url(path).await,
        }
    }
}
