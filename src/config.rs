//! Monitor configuration. JSON on disk, every field optional with defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PORTSCOPE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Background polling
    pub poll: PollConfig,
    /// Which sockets count as a process's ports
    pub sockets: SocketsConfig,
    /// Filter fields beyond name/PID/port
    pub filter: FilterConfig,
    /// Terminate behaviour
    pub termination: TerminationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between snapshots (clamped to at least 1)
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketsConfig {
    /// Also attribute ports of established TCP connections
    pub include_established: bool,
    /// Also attribute bound UDP ports
    pub include_udp: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Match the owner column as well
    pub match_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// How long to wait for the process to exit after the terminate request
    pub grace_millis: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 3 }
    }
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self { grace_millis: 3000 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }
}

impl TerminationConfig {
    pub fn grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.grace_millis)
    }
}

impl MonitorConfig {
    /// Load from JSON file if present and valid; otherwise return default
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(c)) => c,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Strict variant: `Ok(None)` when the file does not exist.
    pub fn try_load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(Some(config))
    }

    /// Config location: explicit path, then `PORTSCOPE_CONFIG_PATH`, then the user config dir.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        dirs::config_dir()
            .map(|d| d.join("portscope").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }
}
