//! Streaming configuration from TOML (`[streaming]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw streaming configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamingConfig {
    /// How long chunk frames are coalesced before a write. 0 writes each
    /// frame as it arrives.
    pub flush_interval_ms: u64,
}

impl Default for FileStreamingConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 10,
        }
    }
}

impl FileStreamingConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
