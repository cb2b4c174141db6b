#![deny(unsafe_code)]

//! Configuration loading and validation for Albumforge.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure.
//! Server credentials may be left out of the file and supplied through the
//! `IMMICH_SERVER_URL` / `IMMICH_API_KEY` environment variables instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable consulted when `server.url` is absent.
pub const SERVER_URL_ENV: &str = "IMMICH_SERVER_URL";
/// Environment variable consulted when `server.api_key` is absent.
pub const API_KEY_ENV: &str = "IMMICH_API_KEY";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Immich server connection settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Selection engine defaults.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Immich server connection settings.
///
/// Both fields are optional in the file; the CLI falls back to the
/// `IMMICH_SERVER_URL` and `IMMICH_API_KEY` environment variables and
/// rejects the run if neither source provides a value.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Immich server (e.g. "https://photos.example.com").
    #[serde(default)]
    pub url: Option<String>,

    /// API key. Prefer the environment variable over committing this to disk.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Resolve the server URL from config or environment, trailing slash
    /// trimmed.
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var(SERVER_URL_ENV).ok())
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Resolve the API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }
}

/// Selection engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Default result limit for content ("smart") searches. Can be
    /// overridden per query with the `@N` suffix notation.
    #[serde(default = "default_content_limit")]
    pub default_content_limit: usize,

    /// Number of asset ids per album-mutation request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_content_limit: default_content_limit(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_content_limit() -> usize {
    200
}

fn default_chunk_size() -> usize {
    500
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server.url {
            if url.is_empty() {
                return Err(ConfigError::Validation(
                    "server.url must not be empty when set".to_string(),
                ));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "server.url must start with http:// or https://, got {url:?}"
                )));
            }
        }
        if self.selection.default_content_limit == 0 {
            return Err(ConfigError::Validation(
                "selection.default_content_limit must be non-zero".to_string(),
            ));
        }
        if self.selection.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "selection.chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.url, None);
        assert_eq!(config.selection.default_content_limit, 200);
        assert_eq!(config.selection.chunk_size, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.selection.default_content_limit, 200);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [server]
            url = "https://photos.example.com"
            api_key = "secret"

            [selection]
            default_content_limit = 150
            chunk_size = 250

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.server.url.as_deref(),
            Some("https://photos.example.com")
        );
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(config.selection.default_content_limit, 150);
        assert_eq!(config.selection.chunk_size, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let toml = r#"
            [server]
            url = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_scheme() {
        let toml = r#"
            [server]
            url = "ftp://photos.example.com"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_content_limit() {
        let toml = r#"
            [selection]
            default_content_limit = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_chunk_size() {
        let toml = r#"
            [selection]
            chunk_size = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_resolved_url_trims_trailing_slash() {
        let toml = r#"
            [server]
            url = "https://photos.example.com/"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.server.resolved_url().as_deref(),
            Some("https://photos.example.com")
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("albumforge.toml");
        tokio::fs::write(
            &path,
            b"[server]\nurl = \"https://photos.example.com\"\n\n[selection]\nchunk_size = 100\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.selection.chunk_size, 100);
        assert_eq!(
            config.server.url.as_deref(),
            Some("https://photos.example.com")
        );
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();
        assert!(AppConfig::load(&path).await.is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
