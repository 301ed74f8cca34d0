use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_CONFIG_FILE: &str = "gamepath.toml";

/// Log directory used when none is given.
const DEFAULT_LOG_DIR_NAME: &str = "gamepath-diagnostics";

/// Check that the GamePath request layer can reach its backend without being
/// redirected, and report anything on this machine that may interfere.
#[derive(Debug, Clone, Parser)]
#[command(name = "gamepath-diagnostics", version, about)]
pub struct Cli {
    /// TOML config file. Defaults apply when it does not exist.
    #[arg(short, long, env = "GAMEPATH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory for the log file.
    #[arg(long, env = "GAMEPATH_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log everything, including per-request traces.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only run local checks; send nothing over the network.
    #[arg(long)]
    pub skip_network: bool,

    /// Force development mode regardless of config.
    #[arg(long)]
    pub development: bool,
}

impl Cli {
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME))
    }
}
