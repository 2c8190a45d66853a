//! Configuration resolution for rdoctor.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Settings file (`<config dir>/rdoctor/settings.json`)
//! 3. Environment variables
//! 4. CLI arguments (applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Collector used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:4111";

/// Complete rdoctor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the log collector (`http(s)://` or `ws(s)://`).
    pub server_url: String,
    /// API key identifying this installation to the collector.
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Whether a non-blank API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// WebSocket URL that captured lines are streamed to.
    ///
    /// `http`/`https` server URLs are mapped to `ws`/`wss`. The API key, when
    /// present, travels as the `apiKey` query parameter.
    pub fn submit_log_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.server_url.trim())?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::Config(format!(
                    "unsupported collector URL scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::Config(format!("cannot use scheme '{scheme}'")))?;
        url.path_segments_mut()
            .map_err(|()| Error::Config("collector URL cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["api", "submit-log"]);
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                url.query_pairs_mut().append_pair("apiKey", key);
            }
        }
        Ok(url)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Default settings file location.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rdoctor").join("settings.json"))
}

/// Load configuration from `path` (defaults if missing) and apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |name| std::env::var(name).ok())
}

fn load_config_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config = if path.exists() {
        debug!(path = %path.display(), "Loading settings file");
        load_config_file(path)?
    } else {
        debug!(path = %path.display(), "No settings file, using defaults");
        Config::default()
    };
    apply_overrides(&mut config, lookup);
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("RDOCTOR_SERVER_URL") {
        debug!(server_url = %url, "Collector URL taken from environment");
        config.server_url = url;
    }
    if let Some(key) = lookup("RDOCTOR_API_KEY") {
        debug!("API key taken from environment");
        config.api_key = Some(key);
    }
}
