use clap::Parser;
use logger_redacted::{init_tracing, LoggerConfig};
use ops_cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(&LoggerConfig::default().verbose(cli.verbose).json(cli.json_logs))?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting clinic-sync");

    ops_cli::commands::run(cli).await
}
