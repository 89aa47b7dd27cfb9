//! CLI configuration, read from a TOML file.
//!
//! The default location is `~/.config/wheretomeet/config.toml`; `--config`
//! or `WHERETOMEET_CONFIG` point at an alternative file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "wheretomeet";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Everything the CLI reads from its config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google credentials for the daemon's provider calls.
    pub google: Option<GoogleSettings>,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Credentials passed to the Google adapters when running `serve`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Places API key.
    pub api_key: Option<String>,

    /// OAuth access token for the Calendar API.
    pub access_token: Option<String>,

    /// OAuth refresh token, when the sign-in flow handed one out.
    pub refresh_token: Option<String>,
}

/// How the CLI finds and talks to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Daemon socket path; unset means the shared default.
    pub socket_path: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Origin for shareable meeting links when running `serve`.
    pub base_origin: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            base_origin: None,
        }
    }
}

impl ClientConfig {
    /// Reads the config file at the default location.
    ///
    /// A missing file is not an error; it yields the defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Reads and parses the config file at `path`.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("malformed {}: {}", path.display(), e))
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join(CONFIG_FILE)
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }
}
