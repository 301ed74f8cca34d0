use gamepath_diagnostics::cli::Cli;
use gamepath_diagnostics::error::DiagnosticsError;
use gamepath_diagnostics::runner::{render, run};

use std::net::TcpListener;
use std::path::Path;

use tempfile::TempDir;

fn cli_for(config: &Path, skip_network: bool) -> Cli {
    Cli {
        config: config.to_path_buf(),
        log_dir: None,
        verbose: false,
        skip_network,
        development: false,
    }
}

/// Base URL of a local port nothing listens on.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn given_skip_network_when_run_then_local_report_rendered() {
    // GIVEN: No config file and network probes disabled
    let dir = TempDir::new().expect("temp dir");
    let cli = cli_for(&dir.path().join("missing.toml"), true);

    // WHEN: Running
    let report = run(&cli).await.expect("run succeeds");
    let json = render(&report).expect("renders");

    // THEN: Healthy, no network sections, guard untouched
    assert!(report.is_healthy());
    assert!(!json.contains("\"connectivity\""));
    assert!(json.contains("\"interference\""));
    assert_eq!(report.guard.inspected, 0);
}

/// **VALUE**: An unreachable backend yields a complete, unhealthy report instead of an error.
///
/// **WHY THIS MATTERS**: The tool exists to diagnose exactly this situation. Failing
/// without a report would leave the operator with nothing.
///
/// **BUG THIS CATCHES**: Would catch a probe failure escaping as `Err` from the run.
#[tokio::test]
async fn given_unreachable_backend_when_run_then_unhealthy_report() {
    // GIVEN: Config pointing at a closed port
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("gamepath.toml");
    std::fs::write(
        &config_path,
        format!("[transport]\nbase_url = \"{}\"\n", closed_port_url()),
    )
    .expect("write config");

    // WHEN: Running every probe
    let report = run(&cli_for(&config_path, false)).await.expect("run succeeds");

    // THEN: Unhealthy, every model failed, redirect check inconclusive
    assert!(!report.is_healthy());
    assert_eq!(report.backend_healthy, Some(false));
    let connectivity = report.connectivity.as_ref().expect("probed");
    assert_eq!(connectivity.results.len(), 4);
    assert!(connectivity.results.values().all(|probe| !probe.success));
    assert!(report.redirect_protection.as_ref().is_some_and(|r| !r.protected));
}

#[tokio::test]
async fn given_invalid_config_when_run_then_config_error() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("gamepath.toml");
    std::fs::write(&config_path, "[transport]\nbase_url = \"ftp://example.com\"\n")
        .expect("write config");

    let error = run(&cli_for(&config_path, true)).await.expect_err("invalid config");

    assert!(matches!(error, DiagnosticsError::Config { .. }));
}
