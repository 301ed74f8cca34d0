use crate::cli::Cli;
use crate::error::DiagnosticsError;

use request_core::config::load_dotenv;
use request_core::diagnostics::{DiagnosticsReport, run_diagnostics};
use request_core::{AppConfig, ClientStack};

use log::{debug, info, warn};

/// Load config, build the request stack and run every probe.
pub async fn run(cli: &Cli) -> Result<DiagnosticsReport, DiagnosticsError> {
    match load_dotenv() {
        Some(path) => debug!("Environment loaded from {}", path.display()),
        None => debug!("No .env file found"),
    }

    let mut config = AppConfig::load(&cli.config)?;
    if cli.development {
        config.environment.development = true;
    }
    info!(
        "Running diagnostics against {} ({} mode)",
        config.transport.base_url,
        if config.environment.development { "development" } else { "production" }
    );

    let stack = ClientStack::from_config(&config)?;
    let report = run_diagnostics(&stack, cli.skip_network).await;

    if report.interference.detected {
        warn!(
            "Software that may intercept requests: {}",
            report.interference.names.join(", ")
        );
    }
    if !report.is_healthy() {
        warn!("One or more ML services are unreachable");
    }

    Ok(report)
}

/// Pretty JSON for stdout.
pub fn render(report: &DiagnosticsReport) -> Result<String, DiagnosticsError> {
    Ok(serde_json::to_string_pretty(report)?)
}
