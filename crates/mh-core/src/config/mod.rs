//! Configuration management for the MayHost client

mod client;
pub mod serde_utils;

pub use client::{ClientConfig, ReconnectConfig};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level layout of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// `[client]` section
    #[serde(default)]
    pub client: ClientConfig,
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mayhost")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Resolve the client configuration.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and the built-in defaults otherwise.
pub fn resolve_client_config(explicit: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let file: ConfigFile = match explicit {
        Some(path) => load_config(path)?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                tracing::debug!("No config file at {:?}, using defaults", default_path);
                ConfigFile::default()
            }
        }
    };

    file.client.validate()?;
    Ok(file.client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[client]
prompt = "ops> "

[client.reconnect]
max_attempts = 2
delay = 250
"#
        )
        .unwrap();

        let config = resolve_client_config(Some(file.path())).unwrap();
        assert_eq!(config.prompt, "ops> ");
        assert_eq!(config.reconnect.max_attempts, 2);
        assert_eq!(config.reconnect.delay, Duration::from_millis(250));
        assert!(config.reconnect.enabled);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            resolve_client_config(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client\nprompt = ").unwrap();
        assert!(matches!(
            resolve_client_config(Some(file.path())),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client.reconnect]\nmultiplier = 0.5").unwrap();
        assert!(matches!(
            resolve_client_config(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_non_finite_multiplier_is_rejected() {
        for value in ["inf", "nan", "-inf"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "[client.reconnect]\nmultiplier = {}", value).unwrap();
            assert!(
                matches!(
                    resolve_client_config(Some(file.path())),
                    Err(ConfigError::Invalid(_))
                ),
                "multiplier = {} was accepted",
                value
            );
        }
    }
}
