// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry records forwarded by the coordination service
//!
//! Workers push actor activation events and profiler samples through the
//! control plane. The service acknowledges them and hands them to a sink; it
//! never interprets them.

use serde::{Deserialize, Serialize};

/// One actor activation, timestamps in seconds since the worker's epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActEvent {
    pub actor_id: i64,
    pub work_stream_id: i64,
    pub act_id: i64,
    pub ready_time: f64,
    pub start_time: f64,
    pub stop_time: f64,
}

impl ActEvent {
    /// Time spent executing, zero if the timestamps are inverted
    pub fn duration(&self) -> f64 {
        (self.stop_time - self.start_time).max(0.0)
    }
}

/// Average interval between activations of one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActIntervalSample {
    pub actor_id: i64,
    pub avg_act_interval: f64,
}

/// A record pushed through the telemetry passthrough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record")]
pub enum TelemetryRecord {
    ActEvent(ActEvent),
    ActInterval(ActIntervalSample),
}

impl TelemetryRecord {
    pub fn actor_id(&self) -> i64 {
        match self {
            TelemetryRecord::ActEvent(e) => e.actor_id,
            TelemetryRecord::ActInterval(s) => s.actor_id,
        }
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
