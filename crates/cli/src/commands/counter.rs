// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counter commands

use clap::Subcommand;
use rdv_daemon::CoordClient;

#[derive(Subcommand)]
pub enum CounterCommand {
    /// Add to a counter (created at zero) and print the new value
    Incr {
        name: String,
        #[arg(default_value = "1", allow_hyphen_values = true)]
        delta: i32,
    },
    /// Delete a counter
    Rm { name: String },
}

pub async fn handle(command: CounterCommand, client: &CoordClient) -> anyhow::Result<()> {
    match command {
        CounterCommand::Incr { name, delta } => {
            let value = client.increase(&name, delta).await?;
            println!("{}", value);
        }
        CounterCommand::Rm { name } => {
            client.delete_counter(&name).await?;
            println!("Deleted {}", name);
        }
    }
    Ok(())
}
