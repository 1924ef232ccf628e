use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";
pub const DEFAULT_FIELD_NAME: &str = "file";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WEB_PORT: u16 = 8080;

/// `[storage]` table.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the history file. Falls back to
    /// `CYBERVELI_HISTORY_DIR`, then the current directory.
    pub path: Option<PathBuf>,
}

/// `[classifier]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    /// Multipart field carrying the file bytes.
    pub field_name: String,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[web]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_WEB_PORT,
        }
    }
}
