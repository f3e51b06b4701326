//! Client configuration for the template server.
//!
//! # Storage layout
//!
//! ```text
//! ~/.templar/
//!   config.yaml   (optional; defaults apply when absent)
//! ```
//!
//! # API pattern
//!
//! - `load_at(home)` — explicit home; used in tests with `TempDir`
//! - `load()` — derives home from `dirs::home_dir()`, delegates to `load_at`
//! - `load_from(path)` — explicit file, used by `--config`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How to reach the template server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://templates.example.com`.
    pub server: String,
    /// Sent as `Authorization: Bearer <token>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Extra request headers, sent verbatim.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Upper bound for the whole reconciliation request.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            token: None,
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Reject values the transport cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server.starts_with("http://") || self.server.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "server '{}' must start with http:// or https://",
                self.server
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(name) = self.headers.keys().find(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty header name '{name}'")));
        }
        Ok(())
    }

    /// `server` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server.trim_end_matches('/')
    }
}

/// `<home>/.templar/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".templar").join("config.yaml")
}

/// Load the configuration under `home`, falling back to defaults when the
/// file does not exist.
pub fn load_at(home: &Path) -> Result<ClientConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ClientConfig, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

/// Load an explicit config file. The file must exist.
pub fn load_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(ClientConfig::default());
    }
    let config: ClientConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".templar/config.yaml"));
    }

    #[test]
    fn defaults_when_missing() {
        let home = TempDir::new().expect("tempdir");
        let config = load_at(home.path()).expect("load");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.server, DEFAULT_SERVER);
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = ClientConfig {
            server: "http://host:8080/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.base_url(), "http://host:8080");
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_http_server_rejected() {
        let config = ClientConfig {
            server: "localhost:8080".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
