use crate::client::{ApiClient, MlClient, ModelType, RequestOptions};
use crate::error::ApiErrorKind;
use crate::transport::Transport;

use std::collections::BTreeMap;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

pub const REDIRECT_PROBE_ENDPOINT: &str = "/ml/test-redirect";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ApiErrorKind>,
    /// No connection could be opened; the service is down or unreachable
    /// rather than misbehaving.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unreachable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub success: bool,
    pub results: BTreeMap<String, ProbeResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectProtectionReport {
    pub protected: bool,
    pub details: String,
}

/// Probe the health endpoint of every model. Failures are recorded, never raised.
pub async fn test_connectivity<T: Transport>(client: &MlClient<T>) -> ConnectivityReport {
    info!("Running ML connectivity diagnostics");
    let mut results = BTreeMap::new();

    for model in ModelType::ALL {
        let outcome = client
            .request::<Value>(&model.health_endpoint(), RequestOptions::get(), model)
            .await;

        let probe = match outcome {
            Ok(_) => ProbeResult {
                success: true,
                error: None,
                error_kind: None,
                unreachable: false,
            },
            Err(e) => {
                warn!("Health probe for {} failed: {}", model, e);
                ProbeResult {
                    success: false,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    unreachable: e.is_connection_failure(),
                }
            }
        };
        results.insert(model.report_key().to_string(), probe);
    }

    ConnectivityReport {
        success: results.values().all(|probe| probe.success),
        results,
    }
}

/// Request an endpoint that redirects and check the redirect is refused.
pub async fn test_redirect_protection<T: Transport>(client: &MlClient<T>) -> RedirectProtectionReport {
    let outcome = client
        .request::<Value>(REDIRECT_PROBE_ENDPOINT, RequestOptions::get(), ModelType::RouteOptimizer)
        .await;

    match outcome {
        Ok(_) => RedirectProtectionReport {
            protected: false,
            details: "Redirect probe succeeded; redirect protection may not be working".to_string(),
        },
        Err(e) if e.kind() == ApiErrorKind::RedirectBlocked => RedirectProtectionReport {
            protected: true,
            details: "Redirect protection is working".to_string(),
        },
        Err(e) if e.is_connection_failure() => RedirectProtectionReport {
            protected: false,
            details: format!("Backend unreachable: {}", e),
        },
        Err(e) => RedirectProtectionReport {
            protected: false,
            details: format!("Unexpected error: {}", e),
        },
    }
}

pub async fn test_backend_connection<T: Transport>(client: &ApiClient<T>) -> bool {
    let healthy = client.health().await;
    if !healthy {
        warn!("Backend health check failed");
    }
    healthy
}
