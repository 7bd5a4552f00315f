//! Chat transcript model.

pub mod payload;

pub use payload::ChatPayload;
