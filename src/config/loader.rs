use std::fs;
use std::path::{Path, PathBuf};

use url::Url;
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/punkr/config.toml` on Unix, or the equivalent
    /// via `dirs::config_dir()`. Falls back to the current directory.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("punkr").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The base URL parses and uses http or https
    /// - Page size and request timeout are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.backend.base_url).map_err(|e| ConfigError::ValidationError {
            message: format!("Invalid base_url '{}': {}", self.backend.base_url, e),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::ValidationError {
                message: format!("Unsupported base_url scheme '{}'", url.scheme()),
            });
        }

        if self.browsing.page_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "browsing.page_size must be greater than 0".to_string(),
            });
        }

        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "backend.timeout_seconds must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.browsing.page_size, 25);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.backend.base_url, "https://api.punkapi.com/v2");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[retry]
max_attempts = 5

[browsing]
search_debounce_ms = 250
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 1000);
        assert!(config.retry.enabled);
        assert_eq!(config.browsing.search_debounce_ms, 250);
        assert_eq!(config.browsing.page_size, 25);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "invalid { toml }").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.browsing.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
