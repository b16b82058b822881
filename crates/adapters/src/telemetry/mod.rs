// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry sinks for records pushed through the control plane

mod file;
mod noop;

pub use file::{FileTelemetrySink, ACT_EVENTS_FILE, ACT_INTERVALS_FILE};
pub use noop::NoOpTelemetrySink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTelemetrySink;

use async_trait::async_trait;
use rdv_core::TelemetryRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from telemetry sinks
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write-only destination for telemetry records
#[async_trait]
pub trait TelemetrySink: Send + Sync + 'static {
    /// Persist or forward one record
    async fn record(&self, record: &TelemetryRecord) -> Result<(), TelemetryError>;
}

#[async_trait]
impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    async fn record(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        (**self).record(record).await
    }
}
