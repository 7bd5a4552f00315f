//! Application-level configuration.
//!
//! - [`BridgeConfig`] groups the parameters read by the interceptor, the
//!   route handlers and the streaming completion bridge.

pub mod bridge_config;

pub use bridge_config::{BridgeConfig, InterceptorParams, StreamingParams, TransferParams};
