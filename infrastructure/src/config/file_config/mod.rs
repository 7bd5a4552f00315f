//! Raw TOML configuration data types
//!
//! These structs mirror the config file. They are deserialized directly
//! and converted into the application's [`BridgeConfig`] and the storage
//! adapter's [`TransportSettings`].

mod interceptor;
mod logging;
mod streaming;
mod transport;

pub use interceptor::FileInterceptorConfig;
pub use logging::FileLoggingConfig;
pub use streaming::FileStreamingConfig;
pub use transport::FileTransportConfig;

use crate::storage::TransportSettings;
use hearth_application::BridgeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("transport.max_chunk_bytes cannot be 0")]
    ZeroChunkSize,

    #[error("transport.read_chunk_bytes cannot be 0")]
    ZeroReadSize,

    #[error("transport.temp_prefix cannot be empty")]
    EmptyTempPrefix,

    #[error("interceptor.popup_poll_attempts cannot be 0")]
    ZeroPollAttempts,

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub transport: FileTransportConfig,
    pub streaming: FileStreamingConfig,
    pub interceptor: FileInterceptorConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Check every section; the first problem wins.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.transport.validate()?;
        self.interceptor.validate()?;
        Ok(())
    }

    pub fn to_bridge_config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::default()
            .with_flush_interval(self.streaming.flush_interval())
            .with_max_chunk_bytes(self.transport.max_chunk_bytes)
            .with_popup_polling(
                self.interceptor.popup_poll_attempts,
                self.interceptor.popup_poll_interval(),
            )
            .with_temp_file(self.transport.temp_file_options());
        if let Some(agent) = &self.transport.app_name {
            config.agent = agent.clone();
        }
        config
    }

    pub fn to_transport_settings(&self) -> TransportSettings {
        self.transport.to_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RuntimeKind;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[transport]
runtime = "sandboxed"
app_name = "tavern"
max_chunk_bytes = 4096
read_chunk_bytes = 1024
temp_prefix = "chat"

[streaming]
flush_interval_ms = 25

[interceptor]
popup_poll_attempts = 5
popup_poll_interval_ms = 100
host_origin = "http://tauri.localhost"

[logging]
transcript_path = "/tmp/hearth.transcript.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let bridge = config.to_bridge_config();
        assert_eq!(bridge.agent, "tavern");
        assert_eq!(bridge.streaming.flush_interval, Duration::from_millis(25));
        assert_eq!(bridge.transfer.max_chunk_bytes, 4096);
        assert_eq!(bridge.transfer.temp_file.prefix, "chat");
        assert_eq!(bridge.transfer.temp_file.extension, "jsonl");
        assert_eq!(bridge.interceptor.popup_poll_attempts, 5);

        let settings = config.to_transport_settings();
        assert_eq!(settings.runtime, RuntimeKind::Sandboxed);
        assert_eq!(settings.app_name, "tavern");
        assert_eq!(settings.read_chunk_bytes, 1024);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[streaming]\nflush_interval_ms = 0\n").unwrap();
        assert_eq!(config.streaming.flush_interval_ms, 0);
        assert_eq!(config.transport.max_chunk_bytes, 1024 * 1024);
        assert_eq!(config.interceptor.popup_poll_attempts, 20);
    }

    #[test]
    fn test_default_config_matches_application_defaults() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_bridge_config(), BridgeConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = FileConfig::default();
        config.transport.max_chunk_bytes = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroChunkSize));

        let mut config = FileConfig::default();
        config.interceptor.host_origin = Some("not a url".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidUrl { field: "interceptor.host_origin", .. })
        ));
    }
}
