// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry configuration
//!
//! Loaded from a TOML file; every key is optional:
//!
//! ```toml
//! state_dir = "/var/lib/watchpost"
//! log_filter = "wp_engine=debug,info"
//!
//! [notify]
//! include_link = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LOG_FILTER: &str = "info";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not determine state directory")]
    NoStateDir,
}

/// Notification settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Append the event's direct link to notifications
    pub include_link: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { include_link: true }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory for the watch log, lock and log files
    pub state_dir: Option<PathBuf>,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    pub log_filter: Option<String>,
    pub notify: NotifyConfig,
}

/// Files derived from the state directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub state_dir: PathBuf,
    /// Watch write-ahead log
    pub wal_path: PathBuf,
    /// Lock/PID file guarding the state directory
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl StatePaths {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            wal_path: state_dir.join("wal").join("watches.wal"),
            lock_path: state_dir.join("watchpost.pid"),
            log_path: state_dir.join("watchpost.log"),
            state_dir,
        }
    }
}

impl Config {
    /// Read a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Default config rooted at `dir`
    pub fn for_state_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Resolve the state directory and the files inside it
    ///
    /// Without an explicit `state_dir`, uses `$XDG_STATE_HOME/watchpost` or
    /// `~/.local/state/watchpost`.
    pub fn paths(&self) -> Result<StatePaths, ConfigError> {
        let state_dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir(
                std::env::var_os("XDG_STATE_HOME").map(PathBuf::from),
                std::env::var_os("HOME").map(PathBuf::from),
            )?,
        };
        Ok(StatePaths::new(state_dir))
    }
}

fn default_state_dir(
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = xdg_state_home.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(xdg.join("watchpost"));
    }
    let home = home.ok_or(ConfigError::NoStateDir)?;
    Ok(home.join(".local/state/watchpost"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
