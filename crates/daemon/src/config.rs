// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! An optional TOML file supplies the settings; `RDV_LISTEN` and
//! `RDV_STATE_DIR` override it. Everything has a default, so the daemon can
//! start with no file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rdv_core::ResetScope;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::dispatch::MisusePolicy;
use crate::endpoint::{Endpoint, EndpointParseError};

pub const ENV_CONFIG: &str = "RDV_CONFIG";
pub const ENV_LISTEN: &str = "RDV_LISTEN";
pub const ENV_STATE_DIR: &str = "RDV_STATE_DIR";

pub const DEFAULT_LISTEN: &str = "127.0.0.1:7420";
pub const DEFAULT_ACCEPT_CAPACITY: usize = 64;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration file as written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// `host:port` or `unix:/path`
    pub listen: Option<String>,
    /// Directory for the pid lock, version file, log and telemetry
    pub state_dir: Option<PathBuf>,
    /// Concurrent accepts per request kind
    pub accept_capacity: Option<usize>,
    pub on_misuse: Option<MisusePolicy>,
    /// How long a connection may sit idle between requests
    #[serde(with = "humantime_serde", default)]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub write_timeout: Option<Duration>,
    /// Registries cleared by a global reset
    pub reset: Option<ResetScope>,
    pub telemetry: RawTelemetryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawTelemetryConfig {
    pub enabled: Option<bool>,
}

impl RawConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Endpoint,
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory for telemetry JSON-lines files
    pub telemetry_dir: PathBuf,
    pub accept_capacity: usize,
    pub on_misuse: MisusePolicy,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub reset_scope: ResetScope,
    pub telemetry_enabled: bool,
}

impl Config {
    /// Load from `path` (or `RDV_CONFIG`) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        let raw = match path {
            Some(path) => RawConfig::from_file(&path)?,
            None => RawConfig::default(),
        };
        Self::resolve(raw, env)
    }

    /// Apply environment overrides and defaults to a parsed file
    pub fn resolve<F>(raw: RawConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = env(ENV_LISTEN)
            .or(raw.listen)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let endpoint: Endpoint = listen.parse()?;

        let state_dir = match env(ENV_STATE_DIR).map(PathBuf::from).or(raw.state_dir) {
            Some(dir) => dir,
            None => default_state_dir(&endpoint, &env)?,
        };

        let mut config = Self::for_endpoint(endpoint, &state_dir);
        if let Some(capacity) = raw.accept_capacity {
            config.accept_capacity = capacity.max(1);
        }
        if let Some(policy) = raw.on_misuse {
            config.on_misuse = policy;
        }
        if let Some(timeout) = raw.idle_timeout {
            config.idle_timeout = timeout;
        }
        if let Some(timeout) = raw.write_timeout {
            config.write_timeout = timeout;
        }
        if let Some(scope) = raw.reset {
            config.reset_scope = scope;
        }
        if let Some(enabled) = raw.telemetry.enabled {
            config.telemetry_enabled = enabled;
        }
        Ok(config)
    }

    /// Defaults for a daemon listening on `endpoint` with state in `state_dir`
    pub fn for_endpoint(endpoint: Endpoint, state_dir: &Path) -> Self {
        Self {
            endpoint,
            state_dir: state_dir.to_path_buf(),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            telemetry_dir: state_dir.join("telemetry"),
            accept_capacity: DEFAULT_ACCEPT_CAPACITY,
            on_misuse: MisusePolicy::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            reset_scope: ResetScope::default(),
            telemetry_enabled: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Endpoint(#[from] EndpointParseError),

    #[error("Could not determine state directory")]
    NoStateDir,
}

/// `$XDG_STATE_HOME/rdv/<hash>` or `~/.local/state/rdv/<hash>`
fn default_state_dir<F>(endpoint: &Endpoint, env: &F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match env("XDG_STATE_HOME") {
        Some(xdg) => PathBuf::from(xdg).join("rdv"),
        None => {
            let home = env("HOME").ok_or(ConfigError::NoStateDir)?;
            PathBuf::from(home).join(".local/state/rdv")
        }
    };
    Ok(base.join(endpoint_hash(endpoint)))
}

/// First 16 hex chars of the SHA-256 of the endpoint
pub fn endpoint_hash(endpoint: &Endpoint) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.to_string().as_bytes());
    let result = hasher.finalize();
    result[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
