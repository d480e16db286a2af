//! Admin configuration: TOML file plus environment overrides.
//!
//! ```toml
//! deployment = "legacy"
//!
//! [store]
//! url = "surrealkv://.tira/db"
//!
//! [logging]
//! json = false
//! level = "debug"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tira_state::StoreConfig;
use tracing::Level;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

/// Which user model the platform runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    /// Users live in the platform's own model and are reloaded with `reload-data`.
    #[default]
    Legacy,
    /// Users are managed by the external community forum.
    Disraptor,
}

impl std::str::FromStr for Deployment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Deployment::Legacy),
            "disraptor" => Ok(Deployment::Disraptor),
            other => Err(format!("unknown deployment: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, `INFO` when the configured value is not a level name.
    pub fn level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

/// Top-level admin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub deployment: Deployment,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl AdminConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path` and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied, for runs without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overlay `TIRA_*` environment variables onto `self`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("TIRA_DEPLOYMENT") {
            self.deployment = value.parse().map_err(|_| ConfigError::Env {
                var: "TIRA_DEPLOYMENT",
                value,
            })?;
        }
        if let Ok(format) = std::env::var("TIRA_LOG_FORMAT") {
            self.logging.json = format.eq_ignore_ascii_case("json");
        }
        if let Ok(level) = std::env::var("TIRA_LOG_LEVEL") {
            self.logging.level = level;
        }
        self.store.apply_env();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AdminConfig::default();
        assert_eq!(config.deployment, Deployment::Legacy);
        assert_eq!(config.store.url, "mem://");
        assert_eq!(config.logging.level(), Level::INFO);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AdminConfig::from_toml_str(
            r#"
            deployment = "disraptor"

            [store]
            url = "surrealkv://.tira/db"
            "#,
        )
        .unwrap();
        assert_eq!(config.deployment, Deployment::Disraptor);
        assert_eq!(config.store.url, "surrealkv://.tira/db");
        assert_eq!(config.store.namespace, "tira");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_unknown_deployment_rejected() {
        let err = AdminConfig::from_toml_str(r#"deployment = "cloud""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\njson = true\nlevel = \"debug\"").unwrap();
        let config = AdminConfig::load(file.path()).unwrap();
        assert!(config.logging.json);
        assert_eq!(config.logging.level(), Level::DEBUG);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AdminConfig::load(Path::new("/nonexistent/tira.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_level_falls_back_to_info() {
        let logging = LoggingConfig {
            json: false,
            level: "chatty".into(),
        };
        assert_eq!(logging.level(), Level::INFO);
    }
}
