use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "feature-selector";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the ingestion/validation/translation backend
    pub backend_url: String,
    /// Timeout applied to every backend request
    pub request_timeout_secs: u64,
    /// Enforce XOR exclusivity while toggling (off by default)
    pub enforce_xor: bool,
    /// Port for the HTTP API
    pub port: u16,
    /// API key required on every route except `/health`
    pub api_key: Option<String>,
    /// Allowed CORS origins. `None` is permissive.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 30,
            enforce_xor: false,
            port: 3000,
            api_key: None,
            cors_origins: None,
        }
    }
}

impl Config {
    /// Load the config file (explicit path, or the platform config directory),
    /// then apply `FSEL_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("FSEL_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(secs) = lookup("FSEL_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("FSEL_TIMEOUT_SECS is not a number: {}", secs))?;
        }
        if let Some(flag) = lookup("FSEL_ENFORCE_XOR") {
            self.enforce_xor = parse_flag(&flag)
                .with_context(|| format!("FSEL_ENFORCE_XOR is not a boolean: {}", flag))?;
        }
        if let Some(port) = lookup("FSEL_PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("FSEL_PORT is not a port number: {}", port))?;
        }
        if let Some(key) = lookup("FSEL_API_KEY") {
            self.api_key = Some(key).filter(|key| !key.is_empty());
        }
        if let Some(origins) = lookup("FSEL_CORS_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
