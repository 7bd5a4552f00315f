//! Runtime parameters of the request bridge.
//!
//! These are application-layer knobs. The infrastructure config loader
//! fills them from TOML and environment; tests build them directly.

use crate::ports::scratch_storage::TempFileOptions;
use std::time::Duration;

/// Streaming completion parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingParams {
    /// How long chunk frames are held back to coalesce writes.
    pub flush_interval: Duration,
}

impl Default for StreamingParams {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(10),
        }
    }
}

/// Child realm discovery parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptorParams {
    /// Polls of a popup window before giving up on it.
    pub popup_poll_attempts: u32,
    pub popup_poll_interval: Duration,
}

impl Default for InterceptorParams {
    fn default() -> Self {
        Self {
            popup_poll_attempts: 20,
            popup_poll_interval: Duration::from_millis(50),
        }
    }
}

/// Scratch file transfer parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParams {
    /// Upper bound on one write to a scratch file.
    pub max_chunk_bytes: usize,
    pub temp_file: TempFileOptions,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 1024 * 1024,
            temp_file: TempFileOptions::default(),
        }
    }
}

/// Everything the interceptor, handlers and streaming bridge read.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Reported by `/version` as `agent`.
    pub agent: String,
    pub version: String,
    pub streaming: StreamingParams,
    pub interceptor: InterceptorParams,
    pub transfer: TransferParams,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            agent: "hearth".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            streaming: StreamingParams::default(),
            interceptor: InterceptorParams::default(),
            transfer: TransferParams::default(),
        }
    }
}

impl BridgeConfig {
    // ==================== Builder Methods ====================

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.streaming.flush_interval = interval;
        self
    }

    pub fn with_max_chunk_bytes(mut self, max: usize) -> Self {
        self.transfer.max_chunk_bytes = max;
        self
    }

    pub fn with_popup_polling(mut self, attempts: u32, interval: Duration) -> Self {
        self.interceptor.popup_poll_attempts = attempts;
        self.interceptor.popup_poll_interval = interval;
        self
    }

    pub fn with_temp_file(mut self, options: TempFileOptions) -> Self {
        self.transfer.temp_file = options;
        self
    }

    /// `agent/version`, as reported to clients.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.agent, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.streaming.flush_interval, Duration::from_millis(10));
        assert_eq!(config.interceptor.popup_poll_attempts, 20);
        assert_eq!(config.transfer.max_chunk_bytes, 1024 * 1024);
        assert!(config.user_agent().starts_with("hearth/"));
    }

    #[test]
    fn builders() {
        let config = BridgeConfig::default()
            .with_flush_interval(Duration::ZERO)
            .with_max_chunk_bytes(64)
            .with_popup_polling(3, Duration::from_millis(5));
        assert_eq!(config.streaming.flush_interval, Duration::ZERO);
        assert_eq!(config.transfer.max_chunk_bytes, 64);
        assert_eq!(config.interceptor.popup_poll_attempts, 3);
    }
}
