use crate::cli::{Cli, DEFAULT_CONFIG_FILE};

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

#[test]
fn given_cli_definition_when_checked_then_valid() {
    Cli::command().debug_assert();
}

#[test]
fn given_no_arguments_when_parsed_then_defaults() {
    let cli = Cli::try_parse_from(["gamepath-diagnostics"]).expect("parses");

    assert!(!cli.verbose);
    assert!(!cli.skip_network);
    assert!(cli.log_dir().ends_with("gamepath-diagnostics"));
    if std::env::var_os("GAMEPATH_CONFIG").is_none() {
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}

#[test]
fn given_flags_when_parsed_then_applied() {
    let cli = Cli::try_parse_from([
        "gamepath-diagnostics",
        "--config",
        "/etc/gamepath.toml",
        "--log-dir",
        "/tmp/gp-logs",
        "-v",
        "--skip-network",
        "--development",
    ])
    .expect("parses");

    assert_eq!(cli.config, PathBuf::from("/etc/gamepath.toml"));
    assert_eq!(cli.log_dir(), PathBuf::from("/tmp/gp-logs"));
    assert!(cli.verbose);
    assert!(cli.skip_network);
    assert!(cli.development);
}
