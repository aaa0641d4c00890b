// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `helmsman` - cron-style container job scheduler daemon

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use hm_daemon::DaemonOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helmsman", version, about = "Cron-style container job scheduler daemon")]
struct Cli {
    /// Log filter (overridden by RUST_LOG), e.g. "info" or "hm_daemon=debug"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler daemon in the foreground
    Daemon(DaemonArgs),
}

#[derive(Args)]
struct DaemonArgs {
    /// Path to the configuration file
    #[arg(long)]
    config: PathBuf,

    /// Disable the container runtime; only local jobs remain useful
    #[arg(long)]
    no_docker: bool,

    /// How often to poll container labels for job declarations
    #[arg(long, default_value = "10s", value_parser = parse_interval)]
    label_poll_interval: Duration,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    hm_core::parse_duration(s)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Daemon(args) => daemon(args).await,
    }
}

async fn daemon(args: DaemonArgs) -> anyhow::Result<()> {
    let mut options = DaemonOptions::new(args.config);
    options.disable_docker = args.no_docker;
    options.label_poll_interval = args.label_poll_interval;

    let daemon = hm_daemon::startup(options).await.context("startup failed")?;
    daemon.run().await.context("shutdown failed")?;
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
