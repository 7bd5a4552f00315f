//! Configuration file loading for hearth
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `HEARTH_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./hearth.toml` or `./.hearth.toml`
//! 4. Global: `$XDG_CONFIG_HOME/hearth/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileInterceptorConfig, FileLoggingConfig,
    FileStreamingConfig, FileTransportConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
