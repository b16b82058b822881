// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Barrier commands

use clap::Subcommand;
use rdv_daemon::CoordClient;

use super::wait_limit;

#[derive(Subcommand)]
pub enum BarrierCommand {
    /// Arrive at a barrier and wait for the others
    Arrive {
        /// Barrier name
        name: String,
        /// Number of participants
        count: u32,
        /// Stop waiting after this many milliseconds (the call stays parked in the daemon; retry under a fresh name)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

pub async fn handle(command: BarrierCommand, client: &CoordClient) -> anyhow::Result<()> {
    match command {
        BarrierCommand::Arrive {
            name,
            count,
            timeout_ms,
        } => {
            client.arrive(&name, count, wait_limit(timeout_ms)).await?;
            println!("Barrier {} released", name);
        }
    }
    Ok(())
}
