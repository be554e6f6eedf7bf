//! Configuration for the calendar store and server.
//!
//! Loaded from `~/.config/calendrier/config.toml` (created with every option
//! commented out when missing), then overridden by `CALENDRIER_*` environment
//! variables, e.g. `CALENDRIER_STORE__BACKEND=memory`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DEFAULT_LISTEN: &str = "127.0.0.1:4096";
static DEFAULT_STORE_PATH: &str = "~/.local/share/calendrier/calendar.json";
static DEFAULT_IO_TIMEOUT: &str = "5s";

/// Environment variable pointing at an alternative config file
pub const CONFIG_PATH_ENV: &str = "CALENDRIER_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Invalid io_timeout '{value}': {source}")]
    IoTimeout {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid listen address '{0}'")]
    Listen(String),
}

/// Which document backend holds the calendar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_io_timeout() -> String {
    DEFAULT_IO_TIMEOUT.to_string()
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Bound on each storage call, in humantime form ("5s", "500ms")
    #[serde(default = "default_io_timeout")]
    pub io_timeout: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: BackendKind::default(),
            path: default_store_path(),
            io_timeout: default_io_timeout(),
        }
    }
}

impl StoreConfig {
    /// Data file path with `~` expanded
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path.to_string_lossy()).into_owned())
    }

    pub fn io_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.io_timeout).map_err(|source| ConfigError::IoTimeout {
            value: self.io_timeout.clone(),
            source,
        })
    }
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen: default_listen(),
            store: StoreConfig::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(shellexpand::tilde(&path).into_owned()));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Load("Could not determine config directory".into()))?
            .join("calendrier");

        Ok(config_dir.join("config.toml"))
    }

    /// Load settings from the config file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("CALENDRIER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::Listen(self.listen.clone()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let contents = format!(
            "\
# calendrier configuration

# Address the HTTP server binds to:
# listen = \"{}\"

[store]
# Where the calendar document lives: \"file\" or \"memory\"
# backend = \"file\"

# Path of the calendar document (file backend only):
# path = \"{}\"

# Bound on each storage call:
# io_timeout = \"{}\"
",
            DEFAULT_LISTEN, DEFAULT_STORE_PATH, DEFAULT_IO_TIMEOUT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Load(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Load(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
