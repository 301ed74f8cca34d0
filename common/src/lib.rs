//! Shared primitives for the GamePath request layer.
//!
//! This crate holds the small value types every other crate leans on:
//! error locations, HTTP status categorisation and redacted credentials.
//! It has no I/O and no async code.
//!
//! ## Architecture
//!
//! - **common** (this crate): Pure value types
//! - **request-core**: URL hardening, transports, API clients, diagnostics
//! - **gamepath-diagnostics**: Operator CLI wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_token;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_token::RedactedToken;

#[cfg(test)]
mod tests;
