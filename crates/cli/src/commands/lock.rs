// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion lock commands

use clap::Subcommand;
use rdv_core::LockStatus;
use rdv_daemon::CoordClient;

use super::wait_limit;

#[derive(Subcommand)]
pub enum LockCommand {
    /// Try to take the lock; prints locked, in-progress or done
    Try {
        /// Lock name
        name: String,
    },
    /// Mark the locked work as done, releasing waiters
    Done {
        /// Lock name
        name: String,
    },
    /// Wait until the lock holder signals done
    Wait {
        /// Lock name
        name: String,
        /// Stop waiting after this many milliseconds (the call stays parked in the daemon; retry under a fresh name)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn status_label(status: LockStatus) -> &'static str {
    match status {
        LockStatus::Locked => "locked",
        LockStatus::InProgress => "in-progress",
        LockStatus::Done => "done",
    }
}

pub async fn handle(command: LockCommand, client: &CoordClient) -> anyhow::Result<()> {
    match command {
        LockCommand::Try { name } => {
            let status = client.try_acquire(&name).await?;
            println!("{}", status_label(status));
        }
        LockCommand::Done { name } => {
            client.signal_done(&name).await?;
            println!("Lock {} done", name);
        }
        LockCommand::Wait { name, timeout_ms } => {
            client.await_done(&name, wait_limit(timeout_ms)).await?;
            println!("Lock {} done", name);
        }
    }
    Ok(())
}
