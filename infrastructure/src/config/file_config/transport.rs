//! Transport configuration from TOML (`[transport]` section)

use super::ConfigValidationError;
use crate::storage::{DEFAULT_ASSET_BASE_URL, DEFAULT_READ_CHUNK_BYTES, RuntimeKind, TransportSettings};
use hearth_application::TempFileOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw transport configuration from TOML
///
/// # Example
///
/// ```toml
/// [transport]
/// runtime = "auto"            # "auto", "sandboxed" or "desktop"
/// max_chunk_bytes = 1048576   # upper bound of one scratch file write
/// read_chunk_bytes = 65536    # one native read on sandboxed runtimes
/// asset_base_url = "http://asset.localhost"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTransportConfig {
    pub runtime: RuntimeKind,
    /// Names the cache directory and the `/version` agent. Defaults to "hearth".
    pub app_name: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub max_chunk_bytes: usize,
    pub read_chunk_bytes: usize,
    pub asset_base_url: String,
    pub temp_prefix: String,
    pub temp_extension: String,
}

impl Default for FileTransportConfig {
    fn default() -> Self {
        let temp_file = TempFileOptions::default();
        Self {
            runtime: RuntimeKind::Auto,
            app_name: None,
            cache_dir: None,
            max_chunk_bytes: 1024 * 1024,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            temp_prefix: temp_file.prefix,
            temp_extension: temp_file.extension,
        }
    }
}

impl FileTransportConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_chunk_bytes == 0 {
            return Err(ConfigValidationError::ZeroChunkSize);
        }
        if self.read_chunk_bytes == 0 {
            return Err(ConfigValidationError::ZeroReadSize);
        }
        if self.temp_prefix.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTempPrefix);
        }
        if url::Url::parse(&self.asset_base_url).is_err() {
            return Err(ConfigValidationError::InvalidUrl {
                field: "transport.asset_base_url",
                value: self.asset_base_url.clone(),
            });
        }
        Ok(())
    }

    pub fn temp_file_options(&self) -> TempFileOptions {
        TempFileOptions::new(self.temp_prefix.clone(), self.temp_extension.clone())
    }

    pub fn to_settings(&self) -> TransportSettings {
        let defaults = TransportSettings::default();
        TransportSettings {
            runtime: self.runtime,
            app_name: self.app_name.clone().unwrap_or(defaults.app_name),
            cache_dir: self.cache_dir.clone(),
            read_chunk_bytes: self.read_chunk_bytes,
            asset_base_url: self.asset_base_url.clone(),
        }
    }
}
