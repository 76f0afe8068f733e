//! Server connection configuration.
//!
//! TOML file plus `OMEVIEW_`-prefixed environment variables, merged with
//! figment. The file location defaults to the platform config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Connection settings for one image-repository server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server root URL (e.g. "https://idr.openmicroscopy.org").
    pub url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bound on concurrent orphaned-image detail requests.
    #[serde(default = "default_orphaned_batch_size")]
    pub orphaned_batch_size: usize,

    /// Thumbnail edge length in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_orphaned_batch_size() -> usize {
    16
}
fn default_thumbnail_size() -> u32 {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
            orphaned_batch_size: default_orphaned_batch_size(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

impl ServerConfig {
    /// Load from an explicit TOML file plus the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("OMEVIEW_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the platform config directory plus the environment.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_config_path())
    }

    /// Serialize to TOML and write to the canonical config path.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = default_config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(&path, toml_str)?;
        Ok(())
    }

    /// The parsed server root URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.url).map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: "no server URL configured".into(),
            });
        }
        self.base_url()?;
        if self.orphaned_batch_size == 0 {
            return Err(ConfigError::Validation {
                field: "orphaned_batch_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "omeview")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("omeview.toml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "url = \"https://omero.example.org\"\norphaned_batch_size = 8"
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.orphaned_batch_size, 8);
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.thumbnail_size, 256);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://omero.example.org/"
        );
    }

    #[test]
    fn missing_url_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = ServerConfig::load(file.path());
        assert!(matches!(
            result,
            Err(ConfigError::Validation { field, .. }) if field == "url"
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "url = \"https://omero.example.org\"\norphaned_batch_size = 0"
        )
        .unwrap();

        assert!(ServerConfig::load(file.path()).is_err());
    }
}
