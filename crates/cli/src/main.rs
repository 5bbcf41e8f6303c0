//! `queuepulse` - terminal dashboard for a contact-center queue

mod commands;
mod config;
mod logging;
mod render;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use crate::config::AppConfig;
use crate::logging::LoggingConfig;
use queuepulse_core::types::ReportDate;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "queuepulse", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "QUEUEPULSE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the queue and print KPIs after every cycle until Ctrl-C
    Watch {
        #[command(flatten)]
        session: SessionArgs,

        /// Seconds between polls
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Fetch once and print KPIs, agents and recent interactions
    Snapshot(SessionArgs),
    /// Fetch once and ask for a forensic analysis of the MOS series
    Analyze(SessionArgs),
    /// Print the effective configuration
    Config {
        /// Also require HTTPS endpoints and a platform token
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args, Debug, Default)]
struct SessionArgs {
    /// Queue name
    #[arg(short, long)]
    queue: Option<String>,

    /// Report date (YYYY-MM-DD), today when absent
    #[arg(short, long)]
    date: Option<ReportDate>,
}

impl SessionArgs {
    fn apply(&self, config: AppConfig, interval: Option<u64>) -> Result<AppConfig> {
        config.with_overrides(self.queue.as_deref(), self.date, interval)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LoggingConfig {
        json: cli.json_logs,
        verbosity: cli.verbose,
    })?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting queuepulse");

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Watch { session, interval } => {
            commands::watch(session.apply(config, interval)?).await
        }
        Command::Snapshot(session) => commands::snapshot(session.apply(config, None)?).await,
        Command::Analyze(session) => commands::analyze(session.apply(config, None)?).await,
        Command::Config { strict } => commands::show_config(&config, strict),
    }
}
