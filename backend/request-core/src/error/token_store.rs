use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Token Store Read Error: {path}: {source} {location}")]
    Read {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Token Store Write Error: {path}: {source} {location}")]
    Write {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Token Store Format Error: {path}: {reason} {location}")]
    Format {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Token Store Lock Error: {location}")]
    Poisoned { location: ErrorLocation },
}
