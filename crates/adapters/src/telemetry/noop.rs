// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op telemetry sink for when telemetry is disabled.

use super::{TelemetryError, TelemetrySink};
use async_trait::async_trait;
use rdv_core::TelemetryRecord;

/// Telemetry sink that discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpTelemetrySink;

impl NoOpTelemetrySink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TelemetrySink for NoOpTelemetrySink {
    async fn record(&self, _record: &TelemetryRecord) -> Result<(), TelemetryError> {
        Ok(())
    }
}
