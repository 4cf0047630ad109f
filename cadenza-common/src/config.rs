//! Configuration loading helpers
//!
//! Services resolve each setting with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module provides the TOML and environment halves; clap handles the
//! command-line half in each service binary.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file path for a service, e.g.
/// `~/.config/cadenza/cadenza-mr.toml` on Linux.
pub fn default_config_path(service_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cadenza").join(format!("{}.toml", service_name)))
}

/// Load a TOML config file, falling back to `T::default()` when the file
/// does not exist. A file that exists but fails to parse is an error rather
/// than a silent fallback.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        tracing::debug!("Config file not found, using defaults: {}", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Read a non-empty environment variable
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable; a set-but-unparseable value is a
/// configuration error, not a silent fallback.
pub fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct TestConfig {
        name: Option<String>,
        port: Option<u16>,
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config: TestConfig =
            load_toml_config(Some(Path::new("/nonexistent/cadenza-test.toml"))).unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(&path, "name = \"cadenza\"\nport = 5740\n").unwrap();

        let config: TestConfig = load_toml_config(Some(&path)).unwrap();
        assert_eq!(config.name.as_deref(), Some("cadenza"));
        assert_eq!(config.port, Some(5740));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "name = [unterminated").unwrap();

        let result: Result<TestConfig> = load_toml_config(Some(&path));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_parse_invalid_is_error() {
        std::env::set_var("CADENZA_TEST_PORT_INVALID", "not-a-number");
        let result: Result<Option<u16>> = env_parse("CADENZA_TEST_PORT_INVALID");
        assert!(result.is_err());
        std::env::remove_var("CADENZA_TEST_PORT_INVALID");
    }
}
