// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake telemetry sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TelemetryError, TelemetrySink};
use async_trait::async_trait;
use rdv_core::TelemetryRecord;
use std::sync::{Arc, Mutex};

/// Fake telemetry sink that records everything it receives
#[derive(Clone, Default)]
pub struct FakeTelemetrySink {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl FakeTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded telemetry
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TelemetrySink for FakeTelemetrySink {
    async fn record(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
