// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value commands

use std::io::Write;

use clap::Subcommand;
use rdv_daemon::CoordClient;

use super::wait_limit;

#[derive(Subcommand)]
pub enum KvCommand {
    /// Publish a value; fails if the key is already published
    Put {
        key: String,
        value: String,
    },
    /// Read a value, waiting until it is published
    Get {
        key: String,
        /// Stop waiting after this many milliseconds (the call stays parked in the daemon; retry under a fresh name)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Withdraw a published value
    Rm {
        key: String,
    },
}

pub async fn handle(command: KvCommand, client: &CoordClient) -> anyhow::Result<()> {
    match command {
        KvCommand::Put { key, value } => {
            client.publish(&key, value.as_bytes()).await?;
            println!("Published {}", key);
        }
        KvCommand::Get { key, timeout_ms } => {
            let value = client.read(&key, wait_limit(timeout_ms)).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.write_all(b"\n")?;
        }
        KvCommand::Rm { key } => {
            client.withdraw(&key).await?;
            println!("Withdrew {}", key);
        }
    }
    Ok(())
}
