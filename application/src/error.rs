//! Route handler errors and their HTTP rendering.

use crate::http::HandlerResponse;
use crate::ports::invoke_bridge::InvokeError;
use crate::ports::scratch_storage::StorageError;
use crate::transport::{StreamDecodeError, TempFileError};
use hearth_domain::{ErrorKind, JsonlError};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid chat payload: {0}")]
    Payload(#[from] JsonlError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A chat file read back from native storage did not decode.
    #[error("stored chat file is unreadable: {0}")]
    Decode(#[from] StreamDecodeError),

    #[error("{primary} (temp file cleanup also failed: {cleanup})")]
    WithCleanupFailure {
        primary: Box<ApiError>,
        cleanup: StorageError,
    },
}

pub type HandlerResult = std::result::Result<Option<HandlerResponse>, ApiError>;

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) | ApiError::Payload(_) => ErrorKind::BadRequest,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::Invoke(e) => e.kind(),
            ApiError::Storage(e) if e.is_not_found() => ErrorKind::NotFound,
            ApiError::Storage(StorageError::Asset { .. } | StorageError::AssetStatus { .. }) => {
                ErrorKind::Upstream
            }
            ApiError::Storage(_) => ErrorKind::Internal,
            ApiError::Decode(_) => ErrorKind::Internal,
            ApiError::WithCleanupFailure { primary, .. } => primary.kind(),
        }
    }

    /// The message shown to the client.
    pub fn message(&self) -> String {
        match self {
            ApiError::Invoke(e) => e.message(),
            other => other.to_string(),
        }
    }

    /// Render as a JSON error response.
    ///
    /// Integrity conflicts carry `error: "integrity"` so the client can
    /// offer a forced overwrite.
    pub fn into_response(self) -> HandlerResponse {
        let kind = self.kind();
        let status =
            StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match kind {
            ErrorKind::IntegrityConflict => json!({ "error": "integrity", "message": self.message() }),
            _ => json!({ "error": self.message() }),
        };
        HandlerResponse::json(status, body)
    }
}

impl From<TempFileError<ApiError>> for ApiError {
    fn from(err: TempFileError<ApiError>) -> Self {
        match err {
            TempFileError::Write(e) => ApiError::Storage(e),
            TempFileError::Use(e) => e,
            TempFileError::UseAndCleanup { primary, cleanup } => ApiError::WithCleanupFailure {
                primary: Box::new(primary),
                cleanup,
            },
        }
    }
}
