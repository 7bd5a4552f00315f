//! Error taxonomy for native command failures.
//!
//! Native commands fail with free-form messages. [`ErrorKind::classify`]
//! maps a normalized message onto the few categories the HTTP surface
//! distinguishes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing file or record. HTTP 404, or an empty result where the
    /// endpoint prefers one.
    NotFound,
    /// The stored chat changed underneath the client. HTTP 400 with
    /// `error: "integrity"` so the client can offer a forced overwrite.
    IntegrityConflict,
    /// Malformed or rejected input. HTTP 400.
    BadRequest,
    /// Access denied by the native side. HTTP 403.
    Forbidden,
    /// A delegated upstream fetch failed. HTTP 502.
    Upstream,
    /// The invoke bridge itself is missing.
    TransportUnavailable,
    /// Anything else. HTTP 500.
    Internal,
}

const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "no such file",
    "enoent",
    "os error 2",
    "cannot find the file",
    "cannot find the path",
    "does not exist",
    "找不到",
    "未找到",
    "不存在",
    "見つかりません",
    "не найден",
    "introuvable",
    "nicht gefunden",
    "no se encuentra",
];

const BAD_REQUEST_MARKERS: &[&str] = &[
    "bad request",
    "validation error",
    "invalid argument",
    "invalid input",
    "missing required",
];

const FORBIDDEN_MARKERS: &[&str] = &["permission denied", "forbidden", "access is denied", "os error 13"];

impl ErrorKind {
    /// Classify a normalized error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if lower.contains("integrity") {
            ErrorKind::IntegrityConflict
        } else if has(NOT_FOUND_MARKERS) {
            ErrorKind::NotFound
        } else if has(FORBIDDEN_MARKERS) {
            ErrorKind::Forbidden
        } else if has(BAD_REQUEST_MARKERS) {
            ErrorKind::BadRequest
        } else {
            ErrorKind::Internal
        }
    }

    /// HTTP status this category maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::IntegrityConflict | ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::Upstream => 502,
            ErrorKind::TransportUnavailable | ErrorKind::Internal => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorKind::NotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::IntegrityConflict => "integrity",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Upstream => "upstream",
            ErrorKind::TransportUnavailable => "transport_unavailable",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
