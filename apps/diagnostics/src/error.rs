use request_core::CoreError;
use request_core::error::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors that end a diagnostics run.
///
/// Probe failures are not errors; they are recorded in the report. These are
/// the failures that prevent a report from being produced at all.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DiagnosticsError {
    /// Logging could not be set up
    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    /// Config file unreadable, malformed or invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Transport or token store could not be built
    #[error("Setup Error: {message} {location}")]
    Setup {
        message: String,
        location: ErrorLocation,
    },

    /// Report could not be rendered
    #[error("Output Error: {message} {location}")]
    Output {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for DiagnosticsError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        DiagnosticsError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for DiagnosticsError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Config(error) => error.into(),
            other => DiagnosticsError::Setup {
                message: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

impl From<serde_json::Error> for DiagnosticsError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        DiagnosticsError::Output {
            message: format!("Failed to render report: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
