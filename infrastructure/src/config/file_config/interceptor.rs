//! Interceptor configuration from TOML (`[interceptor]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Raw interceptor configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInterceptorConfig {
    pub popup_poll_attempts: u32,
    pub popup_poll_interval_ms: u64,
    /// Origin of the host document, e.g. `http://tauri.localhost`.
    pub host_origin: Option<String>,
}

impl Default for FileInterceptorConfig {
    fn default() -> Self {
        Self {
            popup_poll_attempts: 20,
            popup_poll_interval_ms: 50,
            host_origin: None,
        }
    }
}

pub const DEFAULT_HOST_ORIGIN: &str = "http://tauri.localhost/";

impl FileInterceptorConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.popup_poll_attempts == 0 {
            return Err(ConfigValidationError::ZeroPollAttempts);
        }
        if let Some(origin) = &self.host_origin
            && Url::parse(origin).is_err()
        {
            return Err(ConfigValidationError::InvalidUrl {
                field: "interceptor.host_origin",
                value: origin.clone(),
            });
        }
        Ok(())
    }

    pub fn popup_poll_interval(&self) -> Duration {
        Duration::from_millis(self.popup_poll_interval_ms)
    }

    /// The configured host origin, or the default one.
    pub fn host_origin_url(&self) -> Result<Url, ConfigValidationError> {
        let raw = self.host_origin.as_deref().unwrap_or(DEFAULT_HOST_ORIGIN);
        Url::parse(raw).map_err(|_| ConfigValidationError::InvalidUrl {
            field: "interceptor.host_origin",
            value: raw.to_string(),
        })
    }
}
