use super::{LOCATION, RawResponse, RequestDescriptor, Transport};
use crate::error::ApiError;
use crate::url_guard::{RedirectDetector, embeds_absolute_url, host_of, is_absolute, sanitize};

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, warn};
use serde::Serialize;

/// Always overwrite whatever the caller set.
const REDIRECT_MARKER_HEADERS: &[(&str, &str)] = &[
    ("X-No-Redirect", "1"),
    ("X-Max-Redirects", "0"),
    ("X-Anti-Redirect-Protection", "enabled"),
];

/// Added unless the caller already set them.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("X-Requested-With", "XMLHttpRequest"),
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

const ML_OPERATION_HEADER: (&str, &str) = ("X-ML-Operation", "1");

/// Interception counters.
#[derive(Debug, Default)]
pub struct GuardStats {
    inspected: AtomicU64,
    sanitized: AtomicU64,
    blocked: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuardStatsSnapshot {
    pub inspected: u64,
    pub sanitized: u64,
    pub blocked: u64,
}

impl GuardStats {
    pub fn snapshot(&self) -> GuardStatsSnapshot {
        GuardStatsSnapshot {
            inspected: self.inspected.load(Ordering::Relaxed),
            sanitized: self.sanitized.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }

    fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }
}

/// Wraps a transport so every request is sanitized, classified and tagged
/// before dispatch, and every response is checked for redirects after.
pub struct GuardedTransport<T> {
    inner: T,
    detector: RedirectDetector,
    stats: GuardStats,
    pass_through: bool,
}

impl<T: Transport> GuardedTransport<T> {
    pub fn new(inner: T, detector: RedirectDetector) -> Self {
        let pass_through = inner.is_guarded();
        if pass_through {
            warn!("Transport is already guarded; requests will not be inspected twice");
        }

        Self {
            inner,
            detector,
            stats: GuardStats::default(),
            pass_through,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn detector(&self) -> &RedirectDetector {
        &self.detector
    }

    pub fn stats(&self) -> GuardStatsSnapshot {
        self.stats.snapshot()
    }

    /// Pre-dispatch check. Returns the URL to send, or `RedirectBlocked`
    /// without touching the network.
    pub fn inspect(&self, url: &str, is_ml_operation: bool) -> Result<String, ApiError> {
        self.stats.inspected.fetch_add(1, Ordering::Relaxed);
        let environment = self.detector.environment();

        let trusted = is_absolute(url)
            && host_of(url).is_some_and(|host| environment.is_trusted_host(&host));
        let resolved = if trusted {
            let sanitized = sanitize(url, environment).into_owned();
            if sanitized != url {
                self.stats.sanitized.fetch_add(1, Ordering::Relaxed);
                debug!("Sanitized request URL: {} -> {}", url, sanitized);
            }
            sanitized
        } else {
            url.to_string()
        };

        let classification = self.detector.classify(&resolved, is_ml_operation);
        if let Some(reason) = classification.reason.filter(|_| classification.suspicious) {
            self.stats.record_blocked();
            error!("Blocked request before dispatch ({}): {}", reason, url);
            return Err(ApiError::suspicious_url(url, reason));
        }

        if !resolved.starts_with('/') {
            self.stats.record_blocked();
            error!("Blocked request with a URL that is not root-relative: {}", url);
            return Err(ApiError::redirect_blocked(url, "request URL is not root-relative"));
        }

        if embeds_absolute_url(&resolved) {
            self.stats.record_blocked();
            error!("Blocked request path carrying an absolute URL: {}", url);
            return Err(ApiError::redirect_blocked(url, "request path embeds an absolute URL"));
        }

        Ok(resolved)
    }

    fn validate_response(&self, request_url: &str, response: &RawResponse) -> Result<(), ApiError> {
        if response.status.is_redirection() {
            self.stats.record_blocked();
            let location = response.header(LOCATION).unwrap_or("<none>");
            error!(
                "Blocked {} redirect from {} to {}",
                response.status, request_url, location
            );
            return Err(ApiError::redirect_blocked(
                request_url,
                format!("server answered {} redirecting to {}", response.status, location),
            ));
        }

        if let Some(message) = self.detector.has_redirect(request_url, &response.url) {
            self.stats.record_blocked();
            return Err(ApiError::redirect_blocked(request_url, message));
        }

        Ok(())
    }
}

fn apply_anti_redirect_headers(request: &mut RequestDescriptor) {
    for (name, value) in REDIRECT_MARKER_HEADERS {
        request.set_header(name, *value);
    }
    for (name, value) in DEFAULT_HEADERS {
        request.set_default_header(name, *value);
    }
    if request.is_ml_operation {
        let (name, value) = ML_OPERATION_HEADER;
        request.set_header(name, value);
    }
}

impl<T: Transport> Transport for GuardedTransport<T> {
    async fn send(&self, mut request: RequestDescriptor) -> Result<RawResponse, ApiError> {
        if self.pass_through {
            return self.inner.send(request).await;
        }

        let model_type = request.model_type;
        let tag = |error: ApiError| match model_type {
            Some(model) => error.with_model_type(model),
            None => error,
        };

        request.url = self.inspect(&request.url, request.is_ml_operation).map_err(tag)?;
        apply_anti_redirect_headers(&mut request);

        let request_url = request.url.clone();
        let response = self.inner.send(request).await.map_err(tag)?;
        self.validate_response(&request_url, &response).map_err(tag)?;

        Ok(response)
    }

    fn is_guarded(&self) -> bool {
        true
    }
}
