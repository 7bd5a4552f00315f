//! Where scratch files go and how native files are read back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of host runtime.
///
/// A sandboxed (mobile-style) runtime reads native files itself in bounded
/// pieces; a desktop runtime serves them over its asset protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Decide from the build target.
    #[default]
    Auto,
    Sandboxed,
    Desktop,
}

impl RuntimeKind {
    /// `Auto` resolved for this build.
    pub fn resolve(self) -> RuntimeKind {
        match self {
            RuntimeKind::Auto if cfg!(any(target_os = "android", target_os = "ios")) => {
                RuntimeKind::Sandboxed
            }
            RuntimeKind::Auto => RuntimeKind::Desktop,
            other => other,
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RuntimeKind::Auto => "auto",
            RuntimeKind::Sandboxed => "sandboxed",
            RuntimeKind::Desktop => "desktop",
        })
    }
}

pub const DEFAULT_READ_CHUNK_BYTES: usize = 64 * 1024;
pub const DEFAULT_ASSET_BASE_URL: &str = "http://asset.localhost";

#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    pub runtime: RuntimeKind,
    /// Names the per-app cache directory.
    pub app_name: String,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Size of one read from a native file on a sandboxed runtime.
    pub read_chunk_bytes: usize,
    /// Base of converted asset URLs on a desktop runtime.
    pub asset_base_url: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::Auto,
            app_name: "hearth".to_string(),
            cache_dir: None,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
        }
    }
}

impl TransportSettings {
    /// Scratch directory candidates in preference order.
    ///
    /// Sandboxed runtimes prefer the app cache directory, desktop runtimes
    /// the system temp directory.
    pub fn scratch_candidates(&self) -> Vec<PathBuf> {
        let cache = self
            .cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(&self.app_name)));
        let temp = Some(std::env::temp_dir());
        let ordered = match self.runtime.resolve() {
            RuntimeKind::Sandboxed => [cache, temp],
            _ => [temp, cache],
        };
        ordered.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandboxed_prefers_cache_dir() {
        let settings = TransportSettings {
            runtime: RuntimeKind::Sandboxed,
            cache_dir: Some(PathBuf::from("/cache/hearth")),
            ..TransportSettings::default()
        };
        let candidates = settings.scratch_candidates();
        assert_eq!(candidates[0], PathBuf::from("/cache/hearth"));
        assert_eq!(candidates[1], std::env::temp_dir());
    }

    #[test]
    fn desktop_prefers_temp_dir() {
        let settings = TransportSettings {
            runtime: RuntimeKind::Desktop,
            cache_dir: Some(PathBuf::from("/cache/hearth")),
            ..TransportSettings::default()
        };
        assert_eq!(
            settings.scratch_candidates(),
            vec![std::env::temp_dir(), PathBuf::from("/cache/hearth")]
        );
    }

    #[test]
    fn runtime_names_round_trip_through_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            runtime: RuntimeKind,
        }
        let parsed: Wrapper = toml::from_str("runtime = \"sandboxed\"").unwrap();
        assert_eq!(parsed.runtime, RuntimeKind::Sandboxed);
        assert_ne!(RuntimeKind::Auto.resolve(), RuntimeKind::Auto);
    }
}
