// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines telemetry sink
//!
//! Act events and act-interval samples go to separate append-only files in
//! one directory, one JSON object per line.

use super::{TelemetryError, TelemetrySink};
use async_trait::async_trait;
use rdv_core::TelemetryRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const ACT_EVENTS_FILE: &str = "act_events.jsonl";
pub const ACT_INTERVALS_FILE: &str = "act_intervals.jsonl";

/// Appends records to JSON-lines files, opening each file on first use
pub struct FileTelemetrySink {
    dir: PathBuf,
    act_events: Mutex<Option<File>>,
    act_intervals: Mutex<Option<File>>,
}

impl FileTelemetrySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            act_events: Mutex::new(None),
            act_intervals: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn append(
        &self,
        slot: &Mutex<Option<File>>,
        file_name: &str,
        line: Vec<u8>,
    ) -> Result<(), TelemetryError> {
        let path = self.dir.join(file_name);
        let io_err = |source| TelemetryError::Io {
            path: path.clone(),
            source,
        };

        let mut guard = slot.lock().await;
        if guard.is_none() {
            tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(io_err)?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            file.write_all(&line).await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for FileTelemetrySink {
    async fn record(&self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let (slot, file_name, mut line) = match record {
            TelemetryRecord::ActEvent(event) => (
                &self.act_events,
                ACT_EVENTS_FILE,
                serde_json::to_vec(event)?,
            ),
            TelemetryRecord::ActInterval(sample) => (
                &self.act_intervals,
                ACT_INTERVALS_FILE,
                serde_json::to_vec(sample)?,
            ),
        };
        line.push(b'\n');

        self.append(slot, file_name, line).await
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
