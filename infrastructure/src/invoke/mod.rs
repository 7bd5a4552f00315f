//! In-process implementation of the native invoke bridge.

mod event_hub;
mod local_bridge;

pub use event_hub::{EventEmitter, EventHub};
pub use local_bridge::LocalInvokeBridge;
