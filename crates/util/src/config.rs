//! Persistent settings for the `xcs` tool.
//!
//! A small JSON document stored at `~/.config/xcs/config.json` (or the path
//! in `XCS_CONFIG_PATH`) records the XNAT server, the user name and a default
//! project. Credentials other than the user name are never written here;
//! passwords come from the environment or `~/.netrc`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{expand_tilde, xcs_config_dir};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "XCS_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Request timeout used when the file does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error surfaced when reading or writing the config file fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcsConfig {
    /// Base URL of the XNAT server, e.g. `https://xnat.example.org`.
    pub host: Option<String>,
    pub username: Option<String>,
    /// Project used when a command needs one and none was given.
    pub default_project: Option<String>,
    pub timeout_secs: u64,
}

impl Default for XcsConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            default_project: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl XcsConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&default_config_path())
    }

    /// Load from `path`. A missing file yields defaults; an unparsable one
    /// is logged and also yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => Ok(config),
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse config file; using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Returns the config file location, honoring [`CONFIG_PATH_ENV`].
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }
    xcs_config_dir().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = XcsConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, XcsConfig::default());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = XcsConfig {
            host: Some("https://xnat.example.org".into()),
            username: Some("admin".into()),
            default_project: Some("CT1".into()),
            timeout_secs: 10,
        };
        config.save_to_path(&path).unwrap();
        assert_eq!(XcsConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(XcsConfig::load_from_path(&path).unwrap(), XcsConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"host": "http://localhost:8080"}"#).unwrap();
        let config = XcsConfig::load_from_path(&path).unwrap();
        assert_eq!(config.host.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn path_override_is_honored() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("~/custom/xcs.json"), || {
            assert_eq!(default_config_path(), expand_tilde("~/custom/xcs.json"));
        });
    }
}
