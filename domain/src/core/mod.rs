//! Core concepts shared across subdomains.
//!
//! - [`error::ErrorKind`]: native failure taxonomy and HTTP status mapping
//! - [`error_value::ErrorValue`]: bounded-depth message extraction
//! - [`string`]: UTF-8 safe truncation for log previews, prefix stripping

pub mod error;
pub mod error_value;
pub mod string;
