use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpooldexError};

/// Digest of the factory password. Override it with `password_hash` in the
/// config file or `SPOOLDEX_PASSWORD_HASH`.
pub const DEFAULT_PASSWORD_HASH: &str =
    "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9";

pub const ENV_DATA_FILE: &str = "SPOOLDEX_DATA_FILE";
pub const ENV_BIND: &str = "SPOOLDEX_BIND";
pub const ENV_PASSWORD_HASH: &str = "SPOOLDEX_PASSWORD_HASH";

/// Runtime configuration for the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV file holding the inventory
    pub data_file: PathBuf,
    /// Address the web UI listens on
    pub bind: String,
    /// SHA-256 hex digest of the shared password
    pub password_hash: String,
    /// Sessions idle for longer than this are forgotten
    pub session_idle_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("filaments.csv"),
            bind: "127.0.0.1:8501".to_string(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
            session_idle_minutes: 720,
        }
    }
}

impl AppConfig {
    /// Read a YAML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            SpooldexError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_DATA_FILE) {
            self.data_file = PathBuf::from(path);
        }
        if let Some(bind) = non_empty(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(hash) = non_empty(ENV_PASSWORD_HASH) {
            self.password_hash = hash.trim().to_string();
        }
    }

    pub fn session_idle(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_idle_minutes.max(1))
    }
}
