//! Error types for the request layer.
//!
//! Every failure a client call can produce is one of these variants. Domain
//! services branch on [`ApiError::kind`] to decide whether to fall back to
//! mock data; nothing below them swallows an error.

use crate::client::ModelType;
use crate::url_guard::SuspicionReason;

use common::{ErrorLocation, HttpStatusCode};

use std::fmt;
use std::panic::Location;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

/// Fieldless discriminant of [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    Network,
    Timeout,
    HtmlResponse,
    RedirectBlocked,
    HttpStatus,
    Decode,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Network => "network",
            ApiErrorKind::Timeout => "timeout",
            ApiErrorKind::HtmlResponse => "html_response",
            ApiErrorKind::RedirectBlocked => "redirect_blocked",
            ApiErrorKind::HttpStatus => "http_status",
            ApiErrorKind::Decode => "decode",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Network Error: {message} (endpoint: {endpoint}) {location}")]
    Network {
        message: String,
        endpoint: String,
        is_connection: bool,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {endpoint} did not settle within {}ms {location}", .timeout.as_millis())]
    Timeout {
        endpoint: String,
        timeout: Duration,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },

    #[error("HTML Response Error: {endpoint} answered {status} with {} {location}", .content_type.as_deref().unwrap_or("no content type"))]
    HtmlResponse {
        endpoint: String,
        status: HttpStatusCode,
        content_type: Option<String>,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },

    #[error("Redirect Blocked Error: {message} (endpoint: {endpoint}) {location}")]
    RedirectBlocked {
        message: String,
        endpoint: String,
        reason: Option<SuspicionReason>,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },

    #[error("HTTP Status Error: {status} - {message} (endpoint: {endpoint}) {location}")]
    HttpStatus {
        status: HttpStatusCode,
        message: String,
        body: Option<Value>,
        endpoint: String,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} (endpoint: {endpoint}) {location}")]
    Decode {
        message: String,
        endpoint: String,
        model_type: Option<ModelType>,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
            endpoint: endpoint.into(),
            is_connection: false,
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        ApiError::Timeout {
            endpoint: endpoint.into(),
            timeout,
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn html_response(
        endpoint: impl Into<String>,
        status: HttpStatusCode,
        content_type: Option<String>,
    ) -> Self {
        ApiError::HtmlResponse {
            endpoint: endpoint.into(),
            status,
            content_type,
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn redirect_blocked(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::RedirectBlocked {
            message: message.into(),
            endpoint: endpoint.into(),
            reason: None,
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Blocked by the detector before any network I/O.
    #[track_caller]
    pub fn suspicious_url(endpoint: impl Into<String>, reason: SuspicionReason) -> Self {
        ApiError::RedirectBlocked {
            message: format!("suspicious URL rejected: {}", reason.describe()),
            endpoint: endpoint.into(),
            reason: Some(reason),
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Non-2xx response. The message is lifted from the JSON body when it carries one.
    #[track_caller]
    pub fn http_status(
        endpoint: impl Into<String>,
        status: HttpStatusCode,
        body: Option<Value>,
    ) -> Self {
        let message = body
            .as_ref()
            .and_then(body_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        ApiError::HttpStatus {
            status,
            message,
            body,
            endpoint: endpoint.into(),
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
            endpoint: endpoint.into(),
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create from reqwest error with proper categorization.
    #[track_caller]
    pub fn from_reqwest(endpoint: impl Into<String>, timeout: Duration, error: &reqwest::Error) -> Self {
        let endpoint = endpoint.into();

        if error.is_timeout() {
            return ApiError::Timeout {
                endpoint,
                timeout,
                model_type: None,
                location: ErrorLocation::from(Location::caller()),
            };
        }

        ApiError::Network {
            message: error.to_string(),
            endpoint,
            is_connection: error.is_connect(),
            model_type: None,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The connection itself could not be established (refused, DNS, TLS).
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ApiError::Network { is_connection: true, .. })
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Network { .. } => ApiErrorKind::Network,
            ApiError::Timeout { .. } => ApiErrorKind::Timeout,
            ApiError::HtmlResponse { .. } => ApiErrorKind::HtmlResponse,
            ApiError::RedirectBlocked { .. } => ApiErrorKind::RedirectBlocked,
            ApiError::HttpStatus { .. } => ApiErrorKind::HttpStatus,
            ApiError::Decode { .. } => ApiErrorKind::Decode,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Network { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::HtmlResponse { endpoint, .. }
            | ApiError::RedirectBlocked { endpoint, .. }
            | ApiError::HttpStatus { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn model_type(&self) -> Option<ModelType> {
        match self {
            ApiError::Network { model_type, .. }
            | ApiError::Timeout { model_type, .. }
            | ApiError::HtmlResponse { model_type, .. }
            | ApiError::RedirectBlocked { model_type, .. }
            | ApiError::HttpStatus { model_type, .. }
            | ApiError::Decode { model_type, .. } => *model_type,
        }
    }

    /// HTTP status, for the variants that saw a response.
    pub fn status(&self) -> Option<HttpStatusCode> {
        match self {
            ApiError::HtmlResponse { status, .. } | ApiError::HttpStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn suspicion_reason(&self) -> Option<SuspicionReason> {
        match self {
            ApiError::RedirectBlocked { reason, .. } => *reason,
            _ => None,
        }
    }

    /// Tag the error with a model type unless it already carries one.
    pub fn with_model_type(mut self, model: ModelType) -> Self {
        match &mut self {
            ApiError::Network { model_type, .. }
            | ApiError::Timeout { model_type, .. }
            | ApiError::HtmlResponse { model_type, .. }
            | ApiError::RedirectBlocked { model_type, .. }
            | ApiError::HttpStatus { model_type, .. }
            | ApiError::Decode { model_type, .. } => {
                model_type.get_or_insert(model);
            }
        }
        self
    }

    /// Fill in the endpoint when the error was raised without one.
    pub fn with_endpoint(mut self, fallback: &str) -> Self {
        match &mut self {
            ApiError::Network { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::HtmlResponse { endpoint, .. }
            | ApiError::RedirectBlocked { endpoint, .. }
            | ApiError::HttpStatus { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => {
                if endpoint.is_empty() {
                    *endpoint = fallback.to_string();
                }
            }
        }
        self
    }
}

fn body_message(body: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
