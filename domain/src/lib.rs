//! Domain layer for hearth
//!
//! This crate contains the pure rules of the in-process REST bridge. It has
//! no dependencies on the runtime, the file system or the native host.
//!
//! # Core Concepts
//!
//! ## Routing
//!
//! A [`RouteTable`] maps `(method, path)` onto handlers. Exact paths always
//! outrank prefix (wildcard) routes; method-specific routes outrank the
//! universal `*` method.
//!
//! ## Chat payloads
//!
//! Chat transcripts travel as JSONL: one JSON object per line, header first.
//! The [`jsonl`] module encodes, decodes and chunks them.
//!
//! ## Completion streams
//!
//! A [`StreamSession`] turns discrete native events into SSE frames, with
//! provider-shaped error frames for failures.

pub mod chat;
pub mod completion;
pub mod core;
pub mod jsonl;
pub mod routing;

// Re-export commonly used types
pub use chat::ChatPayload;
pub use completion::{
    CompletionSource, FlushHint, NativeStreamEvent, SessionInput, StreamPhase, StreamSession,
    WireFormat,
};
pub use core::{
    error::ErrorKind,
    error_value::{ErrorValue, normalize_error_message},
};
pub use jsonl::{JsonObject, JsonlError};
pub use routing::{MethodMatcher, ResolvedRoute, RouteInfo, RoutePattern, RouteTable};
