use super::sanitize::{host_of, is_absolute};
use crate::config::EnvironmentConfig;
use crate::{API_PROXY_PREFIX, ML_API_PREFIX, ML_PROXY_PREFIX};

use std::fmt;
use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;

const API_PATH_MARKER: &str = "/api/";
const ML_PATH_MARKER: &str = "/ml";
const ML_SHORT_PREFIX: &str = "/ml/";
const REDIRECT_PARAMETER_MARKERS: &[&str] = &["redirect=", "php?url=", "?url=", "&url="];
const FORWARDING_MARKERS: &[&str] = &["redir", "forward=", "go=http"];
const LOCAL_PROXY_PREFIXES: &[&str] = &[API_PROXY_PREFIX, ML_PROXY_PREFIX];

/// Why a URL was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionReason {
    AbsoluteApiUrl,
    DisallowedDomain,
    RedirectParameter,
    ForwardingMarker,
    LocalHostOutsideDevelopment,
    MlPathOutsideProxy,
}

impl SuspicionReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::AbsoluteApiUrl => "absolute URL used for an API call",
            Self::DisallowedDomain => "URL mentions a disallowed domain",
            Self::RedirectParameter => "URL carries a redirect parameter",
            Self::ForwardingMarker => "URL carries a forwarding marker",
            Self::LocalHostOutsideDevelopment => "local host addressed outside development",
            Self::MlPathOutsideProxy => "ML path not routed through the API proxy",
        }
    }

    /// Reasons the development override may downgrade.
    fn is_overridable(&self) -> bool {
        !matches!(self, Self::AbsoluteApiUrl | Self::DisallowedDomain)
    }
}

impl fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SuspicionReason>,
}

impl ClassificationResult {
    pub const SAFE: ClassificationResult = ClassificationResult {
        suspicious: false,
        reason: None,
    };

    pub fn flagged(reason: SuspicionReason) -> Self {
        Self {
            suspicious: true,
            reason: Some(reason),
        }
    }
}

/// Heuristic redirect classifier bound to one environment.
#[derive(Debug, Clone)]
pub struct RedirectDetector {
    environment: Arc<EnvironmentConfig>,
}

impl RedirectDetector {
    pub fn new(environment: Arc<EnvironmentConfig>) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &EnvironmentConfig {
        &self.environment
    }

    pub fn is_suspicious(&self, url: &str, is_ml_operation: bool) -> bool {
        self.classify(url, is_ml_operation).suspicious
    }

    pub fn classify(&self, url: &str, is_ml_operation: bool) -> ClassificationResult {
        let lowered = url.to_ascii_lowercase();

        if is_absolute(&lowered) && lowered.contains(API_PATH_MARKER) {
            error!("Absolute URL used for API call: {}", url);
            return ClassificationResult::flagged(SuspicionReason::AbsoluteApiUrl);
        }

        // Blocked everywhere, proxy prefix or not.
        if let Some(domain) = self.environment.disallowed_domain_in(&lowered) {
            error!("URL mentions disallowed domain {}: {}", domain, url);
            return ClassificationResult::flagged(SuspicionReason::DisallowedDomain);
        }

        if is_local_proxy_path(&lowered) {
            return ClassificationResult::SAFE;
        }

        let Some(reason) = self.match_patterns(url, &lowered, is_ml_operation) else {
            return ClassificationResult::SAFE;
        };

        if self.environment.development && reason.is_overridable() {
            let development_host = host_of(url)
                .is_some_and(|host| self.environment.is_development_host(&host));
            if development_host {
                warn!(
                    "Allowing URL in development that production would block ({}): {}",
                    reason, url
                );
                return ClassificationResult::SAFE;
            }
        }

        warn!("Suspicious URL ({}): {}", reason, url);
        ClassificationResult::flagged(reason)
    }

    fn match_patterns(&self, url: &str, lowered: &str, is_ml_operation: bool) -> Option<SuspicionReason> {
        if REDIRECT_PARAMETER_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Some(SuspicionReason::RedirectParameter);
        }
        if FORWARDING_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Some(SuspicionReason::ForwardingMarker);
        }
        if !self.environment.development
            && host_of(url).is_some_and(|host| EnvironmentConfig::is_loopback_host(&host))
        {
            return Some(SuspicionReason::LocalHostOutsideDevelopment);
        }
        if is_ml_operation
            && lowered.contains(ML_PATH_MARKER)
            && !lowered.contains(ML_API_PREFIX)
            && !lowered.contains(ML_SHORT_PREFIX)
        {
            return Some(SuspicionReason::MlPathOutsideProxy);
        }
        None
    }

    /// Host change or disallowed domain between the requested URL and the
    /// URL a response reports. Returns a description when it is a redirect.
    pub fn has_redirect(&self, request_url: &str, response_url: &str) -> Option<String> {
        if response_url.is_empty() || response_url == request_url {
            return None;
        }

        if let Some(domain) = self.environment.disallowed_domain_in(response_url) {
            error!("Response redirected to disallowed domain {}: {}", domain, response_url);
            return Some(format!("response URL points at disallowed domain {}", domain));
        }

        let request_host = host_of(request_url);
        let response_host = host_of(response_url);
        let host_changed = match (&request_host, &response_host) {
            (Some(requested), Some(responded)) => requested != responded,
            (None, Some(responded)) => !self.environment.is_trusted_host(responded),
            (_, None) => false,
        };

        if host_changed {
            error!("Response host changed: {} -> {}", request_url, response_url);
            return Some(format!("response came from a different host: {}", response_url));
        }

        info!("Response URL differs from request URL: {} -> {}", request_url, response_url);
        None
    }
}

/// Root-relative path under a local proxy prefix with no embedded scheme.
fn is_local_proxy_path(lowered: &str) -> bool {
    if lowered.contains("http:") || lowered.contains("https:") {
        return false;
    }
    LOCAL_PROXY_PREFIXES.iter().any(|prefix| {
        lowered
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    })
}

/// `/api/ml/...` or `/ml/...`.
pub fn validate_ml_endpoint(endpoint: &str) -> bool {
    endpoint.starts_with(ML_API_PREFIX) || endpoint.starts_with(ML_SHORT_PREFIX)
}
