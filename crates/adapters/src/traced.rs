// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::telemetry::{TelemetryError, TelemetrySink};
use async_trait::async_trait;
use rdv_core::TelemetryRecord;
use tracing::Instrument;

/// Wrapper that adds tracing to any TelemetrySink
#[derive(Clone)]
pub struct TracedTelemetrySink<S> {
    inner: S,
}

impl<S> TracedTelemetrySink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn record_kind(record: &TelemetryRecord) -> &'static str {
    match record {
        TelemetryRecord::ActEvent(_) => "act_event",
        TelemetryRecord::ActInterval(_) => "act_interval",
    }
}

#[async_trait]
impl<S: TelemetrySink> TelemetrySink for TracedTelemetrySink<S> {
    async fn record(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let span = tracing::info_span!(
            "telemetry.record",
            kind = record_kind(record),
            actor_id = record.actor_id()
        );

        async {
            let start = std::time::Instant::now();
            let result = self.inner.record(record).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "recorded"),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "record failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
