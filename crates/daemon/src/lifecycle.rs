// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, event loop, shutdown.

use std::fs::File;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use fs2::FileExt;
use rdv_adapters::{FileTelemetrySink, NoOpTelemetrySink, TelemetrySink, TracedTelemetrySink};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError};
use crate::dispatch::{Dispatcher, Inbound};
use crate::endpoint::Listener;
use crate::protocol::{ErrorKind, Response};
use crate::server::{self, ConnectionContext};
use crate::slots::AcceptSlots;

/// Telemetry sink chosen at startup, wrapped with tracing
pub type DaemonTelemetry = TracedTelemetrySink<Box<dyn TelemetrySink>>;

/// Reason given to calls still parked when the daemon stops
pub const SHUTDOWN_REASON: &str = "daemon shutting down";

const INBOUND_QUEUE: usize = 1024;

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Bound listener
    pub listener: Listener,
    /// Owner of all coordination state
    pub dispatcher: Dispatcher<DaemonTelemetry>,
    /// Per-kind accept capacity shared with connection tasks
    pub slots: Arc<AcceptSlots>,
    inbound_tx: mpsc::Sender<Inbound>,
    inbound: mpsc::Receiver<Inbound>,
    next_call: Arc<AtomicU64>,
}

impl DaemonState {
    fn connection_context(&self) -> ConnectionContext {
        ConnectionContext {
            inbound: self.inbound_tx.clone(),
            slots: Arc::clone(&self.slots),
            next_call: Arc::clone(&self.next_call),
            idle_timeout: self.config.idle_timeout,
            write_timeout: self.config.write_timeout,
        }
    }

    /// Accept connections and dispatch calls until `shutdown` resolves or a
    /// shutdown is requested over the wire
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok(connection) => {
                            server::spawn_connection(connection, self.connection_context());
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                        }
                    }
                }

                Some(inbound) = self.inbound.recv() => {
                    self.dispatcher.dispatch(inbound).await;
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }

            // Check if shutdown was requested via IPC or misuse policy
            if self.dispatcher.shutdown_requested() {
                info!("Shutdown requested, stopping event loop");
                break;
            }
        }
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop handing calls to the dispatcher
        self.slots.close();
        self.inbound.close();
        let mut refused = 0;
        while let Ok(inbound) = self.inbound.try_recv() {
            inbound
                .call
                .respond(Response::error(ErrorKind::Unavailable, SHUTDOWN_REASON));
            refused += 1;
        }

        // 2. Answer everything still parked
        let cancelled = self.dispatcher.drain(SHUTDOWN_REASON);
        info!(cancelled, refused, "released pending calls");

        // 3. Remove socket file
        if let Some(socket_path) = self.config.endpoint.socket_path() {
            if socket_path.exists() {
                if let Err(e) = std::fs::remove_file(socket_path) {
                    warn!("Failed to remove socket file: {}", e);
                }
            }
        }

        // 4. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 5. Remove version file
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("Failed to remove version file: {}", e);
            }
        }

        // 6. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory (needed for lock, version, log)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Opened without truncation so a running daemon's pid survives a failed attempt
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Write version file
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 4. Build telemetry sink
    let telemetry: Box<dyn TelemetrySink> = if config.telemetry_enabled {
        Box::new(FileTelemetrySink::new(&config.telemetry_dir))
    } else {
        Box::new(NoOpTelemetrySink::new())
    };
    let dispatcher = Dispatcher::new(
        config.reset_scope,
        TracedTelemetrySink::new(telemetry),
        config.on_misuse,
    );

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if let Some(socket_path) = config.endpoint.socket_path() {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
    }
    let listener = config
        .endpoint
        .bind()
        .await
        .map_err(|e| LifecycleError::BindFailed(config.endpoint.to_string(), e))?;

    let (inbound_tx, inbound) = mpsc::channel(INBOUND_QUEUE);

    info!(
        endpoint = %config.endpoint,
        accept_capacity = config.accept_capacity,
        on_misuse = ?config.on_misuse,
        reset_scope = ?config.reset_scope,
        telemetry = config.telemetry_enabled,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        dispatcher,
        slots: Arc::new(AcceptSlots::new(config.accept_capacity)),
        inbound_tx,
        inbound,
        next_call: Arc::new(AtomicU64::new(1)),
    })
}

/// Clean up resources on startup failure
///
/// A lock failure means another daemon owns these files; leave them alone.
fn cleanup_on_failure(config: &Config, error: &LifecycleError) {
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }

    if let Some(socket_path) = config.endpoint.socket_path() {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
    }

    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }

    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Directory holding the daemon log
pub fn log_dir(config: &Config) -> Result<PathBuf, LifecycleError> {
    config
        .log_path
        .parent()
        .map(PathBuf::from)
        .ok_or(LifecycleError::NoStateDir)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
