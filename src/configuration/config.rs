use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use super::types::*;
use crate::error_handling::types::ConfigError;

/// Application configuration.
///
/// Read from a TOML file with three optional tables; anything left out
/// takes its default:
///
/// ```toml
/// [storage]
/// path = "/var/lib/cyberveli"
///
/// [classifier]
/// endpoint = "https://classifier.example/predict"
/// field_name = "file"
/// timeout_secs = 30
///
/// [web]
/// enabled = true
/// port = 8080
/// ```
///
/// Command-line flags are applied on top with [`Config::with_overrides`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub web: WebConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(
        mut self,
        storage_path: Option<PathBuf>,
        endpoint: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = storage_path {
            self.storage.path = Some(path);
        }
        if let Some(endpoint) = endpoint {
            self.classifier.endpoint = endpoint;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.classifier.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::BadEndpoint(endpoint.clone()));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "classifier.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.classifier.field_name.trim().is_empty() {
            return Err(ConfigError::NotInRange(
                "classifier.field_name must not be empty".to_string(),
            ));
        }
        if let Some(path) = &self.storage.path {
            if path.is_file() {
                return Err(ConfigError::NotADirectory(path.display().to_string()));
            }
        }
        Ok(())
    }
}
