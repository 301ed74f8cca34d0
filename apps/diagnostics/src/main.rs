use gamepath_diagnostics::cli::Cli;
use gamepath_diagnostics::logger::initialize as LoggerInitialize;
use gamepath_diagnostics::runner::{render, run};

use std::fs::create_dir_all;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Ensure log directory exists
    let log_dir = cli.log_dir();
    if let Err(e) = create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {e}", log_dir.display());
        return ExitCode::FAILURE;
    }

    // Initialize logger FIRST
    if let Err(e) = LoggerInitialize(&log_dir, cli.verbose) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!("GamePath diagnostics starting");
    info!("Log directory: {}", log_dir.display());

    let outcome = match run(&cli).await {
        Ok(report) => render(&report).map(|json| (json, report.is_healthy())),
        Err(e) => Err(e),
    };

    match outcome {
        Ok((json, healthy)) => {
            println!("{json}");
            if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
