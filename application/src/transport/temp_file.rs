//! Scoped scratch files.
//!
//! A [`TempFileHandle`] is owned by the operation that created it. Cleanup
//! runs on every exit path: explicitly through [`TempFileHandle::cleanup`],
//! or as a spawned best-effort removal if the handle is dropped first.

use crate::ports::scratch_storage::{ScratchStorage, StorageError, TempFileOptions};
use bytes::Bytes;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of [`with_temp_file`].
#[derive(Error, Debug)]
pub enum TempFileError<E> {
    #[error("failed to write temp file: {0}")]
    Write(StorageError),

    #[error("{0}")]
    Use(E),

    /// Both the operation and the cleanup after it failed.
    #[error("{primary} (temp file cleanup also failed: {cleanup})")]
    UseAndCleanup { primary: E, cleanup: StorageError },
}

impl<E> TempFileError<E> {
    /// The operation's own error, if it got that far.
    pub fn primary(&self) -> Option<&E> {
        match self {
            TempFileError::Write(_) => None,
            TempFileError::Use(e) | TempFileError::UseAndCleanup { primary: e, .. } => Some(e),
        }
    }
}

/// A materialized scratch file.
pub struct TempFileHandle {
    path: PathBuf,
    storage: Arc<dyn ScratchStorage>,
    released: bool,
}

impl TempFileHandle {
    /// Write `chunks` to a fresh scratch file.
    pub async fn materialize<I>(
        storage: Arc<dyn ScratchStorage>,
        chunks: I,
        options: &TempFileOptions,
    ) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send,
    {
        let mut chunks = chunks.into_iter();
        let path = storage.write_temp_file(&mut chunks, options).await?;
        debug!("Materialized temp file {}", path.display());
        Ok(Self {
            path,
            storage,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file. Runs at most once.
    pub async fn cleanup(mut self) -> Result<(), StorageError> {
        self.released = true;
        self.storage.remove_file(&self.path).await
    }
}

impl Drop for TempFileHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Temp file {} leaked: no runtime for cleanup", self.path.display());
            return;
        };
        let storage = self.storage.clone();
        let path = std::mem::take(&mut self.path);
        runtime.spawn(async move {
            if let Err(e) = storage.remove_file(&path).await {
                warn!("Deferred temp file cleanup failed: {}", e);
            }
        });
    }
}

/// Materialize `chunks`, run `use_file` on the path, then clean up.
///
/// Cleanup runs whether or not `use_file` succeeds. When both fail the
/// returned error carries both causes. A cleanup failure after a
/// successful use is logged and does not fail the call.
pub async fn with_temp_file<I, F, Fut, T, E>(
    storage: Arc<dyn ScratchStorage>,
    chunks: I,
    options: &TempFileOptions,
    use_file: F,
) -> Result<T, TempFileError<E>>
where
    I: IntoIterator<Item = Bytes>,
    I::IntoIter: Send,
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let handle = TempFileHandle::materialize(storage, chunks, options)
        .await
        .map_err(TempFileError::Write)?;
    let outcome = use_file(handle.path().to_path_buf()).await;
    let cleanup = handle.cleanup().await;

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(e)) => {
            warn!("Temp file cleanup failed after success: {}", e);
            Ok(value)
        }
        (Err(primary), Ok(())) => Err(TempFileError::Use(primary)),
        (Err(primary), Err(cleanup)) => Err(TempFileError::UseAndCleanup { primary, cleanup }),
    }
}
