use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("HTTP Client Build Error: {message} {location}")]
    Build {
        message: String,
        location: ErrorLocation,
    },

    #[error("Base URL Error: {message} {location}")]
    BaseUrl {
        message: String,
        location: ErrorLocation,
    },
}

impl From<url::ParseError> for TransportError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        TransportError::BaseUrl {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        TransportError::Build {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
