use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod config;
mod logging;

use cli::{Args, Mode};
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env first so flags can fall back to its variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    let config = Config::load();

    // Keep the guards alive until exit so buffered log lines are flushed
    let _log_guards = match logging::initialize_tracing(config.log_dir.as_deref()) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            Vec::new()
        }
    };

    match args.mode {
        Mode::Fork(fork) => fork_exit_code(commands::fork::run_fork(&config, fork).await),
        Mode::Cleanup => {
            commands::cleanup::run_cleanup(&config).await;
            ExitCode::SUCCESS
        }
    }
}

/// Failures are logged through the redacting subscriber only, never printed raw
fn fork_exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fork failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
