// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon start/stop for local use

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Subcommand;
use rdv_daemon::config::{Config, ENV_LISTEN};
use rdv_daemon::{ClientError, CoordClient, Endpoint};

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start rdvd in the background and wait until it answers
    Start {
        /// Daemon config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Ask the daemon to shut down and wait until it is gone
    Stop,
}

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for waiting for daemon to start
fn timeout_connect() -> Duration {
    parse_duration_ms("RDV_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to stop
fn timeout_exit() -> Duration {
    parse_duration_ms("RDV_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
fn poll_interval() -> Duration {
    parse_duration_ms("RDV_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

pub async fn handle(command: DaemonCommand, endpoint: &Endpoint) -> Result<()> {
    match command {
        DaemonCommand::Start { config } => start(endpoint, config.as_deref()).await,
        DaemonCommand::Stop => stop(endpoint).await,
    }
}

async fn start(endpoint: &Endpoint, config_path: Option<&Path>) -> Result<()> {
    let client = CoordClient::new(endpoint.clone());
    if client.ping().await.is_ok() {
        println!("Daemon already running at {}", endpoint);
        return Ok(());
    }

    // Resolve the daemon's config the way it will, to find its log
    let listen = endpoint.to_string();
    let config = Config::load_with(config_path, |key| {
        if key == ENV_LISTEN {
            Some(listen.clone())
        } else {
            std::env::var(key).ok()
        }
    })?;

    let mut child = start_daemon_background(endpoint, config_path)?;
    let started = Instant::now();

    while started.elapsed() < timeout_connect() {
        // Check if daemon process exited early (startup failure)
        if let Ok(Some(status)) = child.try_wait() {
            match read_startup_error(&config.log_path) {
                Some(err) => bail!("Failed to start daemon: {}", err),
                None => bail!("Failed to start daemon: exited with {}", status),
            }
        }

        match client.ping().await {
            Ok(()) => {
                println!("Daemon started at {}", endpoint);
                return Ok(());
            }
            Err(e) => tracing::debug!(error = %e, "daemon not ready"),
        }
        tokio::time::sleep(poll_interval()).await;
    }

    match read_startup_error(&config.log_path) {
        Some(err) => bail!("Failed to start daemon: {}", err),
        None => bail!("Connection timeout waiting for daemon to start"),
    }
}

async fn stop(endpoint: &Endpoint) -> Result<()> {
    let client = CoordClient::new(endpoint.clone());
    match client.shutdown().await {
        Ok(()) => {}
        Err(ClientError::DaemonNotRunning(_)) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let started = Instant::now();
    while started.elapsed() < timeout_exit() {
        if matches!(client.ping().await, Err(ClientError::DaemonNotRunning(_))) {
            println!("Daemon stopped");
            return Ok(());
        }
        tokio::time::sleep(poll_interval()).await;
    }
    bail!("Daemon did not stop within {:?}", timeout_exit())
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(endpoint: &Endpoint, config: Option<&Path>) -> Result<Child> {
    let mut command = Command::new(find_rdvd_binary());
    if let Some(config) = config {
        command.arg(config);
    }
    Ok(command
        .env(ENV_LISTEN, endpoint.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?)
}

/// Find the rdvd binary
fn find_rdvd_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("RDV_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("rdvd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("rdvd")
}

/// Startup marker prefix that daemon writes to log before anything else.
/// Full format: "--- rdvd: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- rdvd: starting (pid: ";

/// Read daemon log from the last startup marker, looking for errors.
/// Returns the error message if found, None otherwise.
fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;

    let errors: Vec<String> = content[start_pos..]
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .map(|line| {
            // Format: "timestamp LEVEL target: message"
            line.split_once(": ")
                .map_or(line, |(_, msg)| msg)
                .to_string()
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
