use super::{RawResponse, RequestDescriptor, Transport};
use crate::config::TransportConfig;
use crate::error::{ApiError, TransportError};
use crate::url_guard::strip_path_prefix;

use common::HttpStatusCode;

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, trace};
use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

/// The real network transport.
///
/// Redirects are never followed and no cookie store is kept; the only
/// credential on the wire is the `Authorization` header the clients add.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    proxy_prefix: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            base_url,
            proxy_prefix: config.proxy_prefix.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute backend URL for a root-relative request path, with the proxy
    /// prefix consumed.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::redirect_blocked(
                path,
                "transport only accepts root-relative paths",
            ));
        }

        let forwarded = strip_path_prefix(path, &self.proxy_prefix);
        let relative = &forwarded[1..];
        if relative.starts_with('/') || Url::parse(relative).is_ok() {
            return Err(ApiError::redirect_blocked(
                path,
                "request path would replace the backend origin",
            ));
        }

        let joined = self
            .base_url
            .join(relative)
            .map_err(|e| ApiError::network(path, format!("cannot resolve path: {}", e)))?;

        // Host resolution stays with the configured backend.
        if joined.origin() != self.base_url.origin() {
            return Err(ApiError::redirect_blocked(
                path,
                format!("request path resolved off the backend origin: {}", joined),
            ));
        }

        Ok(joined)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, ApiError> {
        let target = self.resolve(&request.url)?;
        trace!("{} {} -> {}", request.method, request.url, target);

        let mut builder = self
            .client
            .request(request.method.clone(), target.clone())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&request.url, request.timeout, &e))?;

        let status = HttpStatusCode(response.status().as_u16());
        let url = if *response.url() == target {
            request.url.clone()
        } else {
            response.url().to_string()
        };
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(&request.url, request.timeout, &e))?
            .to_vec();

        debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(RawResponse {
            status,
            url,
            headers,
            body,
        })
    }
}
