// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdv - control-plane coordination CLI

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{barrier, counter, daemon, kv, lock};
use rdv_daemon::config::DEFAULT_LISTEN;
use rdv_daemon::{CoordClient, Endpoint};

use crate::output::OutputFormat;

/// Env var naming the daemon endpoint
const ENV_ENDPOINT: &str = "RDV_ENDPOINT";

#[derive(Parser)]
#[command(
    name = "rdv",
    version,
    about = "rdv - barriers, locks, key-value exchange and counters for a cluster"
)]
struct Cli {
    /// Daemon endpoint (host:port or unix:/path) [env: RDV_ENDPOINT]
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is answering
    Ping,
    /// Show daemon uptime and registry occupancy
    Status {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Stop the daemon, cancelling parked calls
    Shutdown,
    /// Clear locks and key-value entries (per the daemon's reset scope)
    Reset,
    /// Rendezvous barriers
    Barrier {
        #[command(subcommand)]
        command: barrier::BarrierCommand,
    },
    /// Completion locks
    Lock {
        #[command(subcommand)]
        command: lock::LockCommand,
    },
    /// Blocking key-value exchange
    Kv {
        #[command(subcommand)]
        command: kv::KvCommand,
    },
    /// Counters
    Counter {
        #[command(subcommand)]
        command: counter::CounterCommand,
    },
    /// Start or stop a local daemon
    Daemon {
        #[command(subcommand)]
        command: daemon::DaemonCommand,
    },
}

fn resolve_endpoint(flag: Option<String>) -> Result<Endpoint> {
    let raw = flag
        .or_else(|| std::env::var(ENV_ENDPOINT).ok())
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    Ok(raw.parse()?)
}

fn setup_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let endpoint = resolve_endpoint(cli.endpoint)?;
    tracing::debug!(%endpoint, "using endpoint");

    // Daemon management spawns or stops the process itself
    if let Commands::Daemon { command } = cli.command {
        return daemon::handle(command, &endpoint).await;
    }

    let client = CoordClient::new(endpoint);

    match cli.command {
        Commands::Ping => {
            client.ping().await?;
            println!("pong");
        }
        Commands::Status { format } => {
            let report = client.status().await?;
            output::print(&output::StatusView::from(report), format);
        }
        Commands::Shutdown => {
            client.shutdown().await?;
            println!("Daemon shutting down");
        }
        Commands::Reset => {
            client.reset_all().await?;
            println!("Reset");
        }
        Commands::Barrier { command } => barrier::handle(command, &client).await?,
        Commands::Lock { command } => lock::handle(command, &client).await?,
        Commands::Kv { command } => kv::handle(command, &client).await?,
        Commands::Counter { command } => counter::handle(command, &client).await?,
        Commands::Daemon { .. } => {}
    }

    Ok(())
}
