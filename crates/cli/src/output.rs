// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use rdv_core::ServiceStats;
use rdv_daemon::StatusReport;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Daemon status as shown to the operator
#[derive(Serialize)]
pub struct StatusView {
    uptime_secs: u64,
    #[serde(flatten)]
    stats: ServiceStats,
}

impl From<StatusReport> for StatusView {
    fn from(report: StatusReport) -> Self {
        Self {
            uptime_secs: report.uptime_secs,
            stats: report.stats,
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "uptime:         {}s", self.uptime_secs)?;
        writeln!(
            f,
            "barriers:       {} ({} parked)",
            s.barriers, s.parked_arrivals
        )?;
        writeln!(
            f,
            "locks:          {} active, {} done ({} waiting)",
            s.locks_active, s.locks_done, s.await_waiters
        )?;
        writeln!(
            f,
            "kv:             {} published ({} pending reads)",
            s.kv_published, s.pending_reads
        )?;
        write!(f, "counters:       {}", s.counters)
    }
}
