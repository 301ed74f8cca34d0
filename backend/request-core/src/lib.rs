pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod services;
pub mod stack;
pub mod token_store;
pub mod transport;
pub mod url_guard;

#[cfg(test)]
mod tests;

pub use client::{ApiClient, MlClient, ModelType, RequestOptions, RetryPolicy};
pub use config::AppConfig;
pub use error::{ApiError, ApiErrorKind, CoreError};
pub use stack::ClientStack;
pub use transport::{GuardedTransport, HttpTransport, RawResponse, RequestDescriptor, Transport};

pub const PRODUCTION_DOMAIN: &str = "gamepathai.com";
pub const BACKEND_LOAD_BALANCER_HOST: &str =
    "gamepathai-dev-lb-1728469102.us-east-1.elb.amazonaws.com";
pub const LOCAL_DEVELOPMENT_HOST: &str = "localhost";
pub const LOOPBACK_HOST: &str = "127.0.0.1";

pub const API_PROXY_PREFIX: &str = "/api";
pub const ML_PROXY_PREFIX: &str = "/ml";
pub const ML_API_PREFIX: &str = const_format::concatcp!(API_PROXY_PREFIX, ML_PROXY_PREFIX, "/");

pub const CLIENT_SOURCE: &str = "gamepath-request-core";
