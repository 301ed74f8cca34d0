pub mod api;
pub mod config;
pub mod token_store;
pub mod transport;

pub use api::{ApiError, ApiErrorKind};
pub use config::ConfigError;
pub use token_store::TokenStoreError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
