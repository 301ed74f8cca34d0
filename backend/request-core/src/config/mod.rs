pub mod client;
pub mod environment;

pub use client::ClientConfig;
pub use environment::EnvironmentConfig;

use crate::API_PROXY_PREFIX;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const ENVIRONMENT_VAR: &str = "GAMEPATH_ENV";
pub const BASE_URL_VAR: &str = "GAMEPATH_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Backend origin the proxy forwards root-relative paths to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Leading path segment consumed before forwarding, like a dev-server
    /// proxy rewrite. `/api/games` and `/games` reach the same backend path.
    #[serde(default = "default_proxy_prefix")]
    pub proxy_prefix: String,

    /// TCP connect deadline, independent of the per-request timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy_prefix: default_proxy_prefix(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// JSON file the tokens persist to. Tokens live in memory when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default = "ClientConfig::api")]
    pub api: ClientConfig,

    #[serde(default = "ClientConfig::ml")]
    pub ml: ClientConfig,

    #[serde(default)]
    pub tokens: TokenConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            transport: TransportConfig::default(),
            api: ClientConfig::api(),
            ml: ClientConfig::ml(),
            tokens: TokenConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_proxy_prefix() -> String {
    API_PROXY_PREFIX.to_string()
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AppConfig {
    /// Load config from a TOML file and apply environment overrides.
    ///
    /// # Returns
    ///
    /// Returns `Ok(AppConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path).map_err(|e| {
                warn!("Failed to read config file: {}", e);
                ConfigError::ReadError {
                    location: ErrorLocation::from(Location::caller()),
                    path: config_path.to_path_buf(),
                    source: e,
                }
            })?;

            let config: AppConfig = toml::from_str(&contents).map_err(|e| {
                warn!("Failed to parse config TOML: {}", e);
                ConfigError::ParseError {
                    location: ErrorLocation::from(Location::caller()),
                    path: config_path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;

            info!("Config loaded from {}", config_path.display());
            config
        } else {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `GAMEPATH_ENV` and `GAMEPATH_BASE_URL`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENVIRONMENT_VAR) {
            match mode.trim().to_ascii_lowercase().as_str() {
                "development" | "dev" => self.environment.development = true,
                "production" | "prod" => self.environment.development = false,
                other => warn!("Ignoring unknown {} value '{}'", ENVIRONMENT_VAR, other),
            }
        }

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            info!("Backend base URL overridden by {}", BASE_URL_VAR);
            self.transport.base_url = base_url.trim().to_string();
        }
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, client) in [("api", &self.api), ("ml", &self.ml)] {
            if client.timeout_ms == 0 {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("[{}] timeout_ms must be greater than zero", section),
                });
            }
        }

        if self.transport.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "[transport] connect_timeout_ms must be greater than zero".to_string(),
            });
        }

        let base_url = &self.transport.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid base_url format: {}", base_url),
            });
        }

        if !self.transport.proxy_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "proxy_prefix must start with '/': {}",
                    self.transport.proxy_prefix
                ),
            });
        }

        let hosts = self
            .environment
            .trusted_hosts
            .iter()
            .chain(self.environment.disallowed_domains.iter());
        for host in hosts {
            if host.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: "host entries cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Attempts to load .env from known locations.
///
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}
