//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod stream_completion;

pub use stream_completion::{CompletionStream, StreamingCompletionBridge};
