//! The seam every outbound request crosses.
//!
//! Clients depend on [`Transport`], never on a concrete HTTP stack:
//! - [`HttpTransport`] performs the real call (reqwest, redirects disabled)
//! - [`GuardedTransport`] wraps any transport with URL inspection, header
//!   injection and response re-validation
//! - [`StubTransport`] is the scripted double used by tests

pub mod guard;
pub mod http;
pub mod stub;

pub use guard::{GuardStats, GuardStatsSnapshot, GuardedTransport};
pub use http::HttpTransport;
pub use reqwest::Method;
pub use stub::{StubOutcome, StubTransport};

use crate::client::ModelType;
use crate::error::ApiError;

use common::HttpStatusCode;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

pub const CONTENT_TYPE: &str = "content-type";
pub const LOCATION: &str = "location";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const HTML_CONTENT_TYPE: &str = "text/html";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// One outbound request. Built fresh per call and consumed by `send`.
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
    pub is_ml_operation: bool,
    pub model_type: Option<ModelType>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            is_ml_operation: false,
            model_type: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (name, value) in headers {
            self.set_header(name, value.clone());
        }
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark as an ML operation, optionally attributed to a model.
    pub fn ml(mut self, model_type: Option<ModelType>) -> Self {
        self.is_ml_operation = true;
        self.model_type = model_type;
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Insert only when the caller has not set the header already.
    pub fn set_default_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// What came back from the wire, before any classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: HttpStatusCode,
    /// Final URL. The request's own URL when nothing moved it.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status: HttpStatusCode(status),
            url: String::new(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .with_body(body.to_string().into_bytes())
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, "text/html; charset=utf-8")
            .with_body(body.as_bytes().to_vec())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// `application/json` or any `+json` media type.
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let media = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            media == JSON_CONTENT_TYPE || media.ends_with("+json")
        })
    }

    pub fn is_html(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(HTML_CONTENT_TYPE))
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends one request and settles with the raw response or a classified error.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<RawResponse, ApiError>> + Send;

    /// Whether this transport already applies the redirect guard.
    fn is_guarded(&self) -> bool {
        false
    }
}
