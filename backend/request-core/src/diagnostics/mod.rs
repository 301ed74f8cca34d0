//! Operator-facing probes. Observability only: nothing here changes how
//! requests are handled.

pub mod connectivity;
pub mod interference;

pub use connectivity::{
    ConnectivityReport, ProbeResult, RedirectProtectionReport, test_backend_connection,
    test_connectivity, test_redirect_protection,
};
pub use interference::{InterferenceReport, check_for_interfering_software, classify_interference};

use crate::stack::ClientStack;
use crate::transport::{GuardStatsSnapshot, Transport};

use serde::Serialize;

/// Everything the diagnostics run found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport {
    pub development: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_healthy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<ConnectivityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_protection: Option<RedirectProtectionReport>,
    pub interference: InterferenceReport,
    pub guard: GuardStatsSnapshot,
}

impl DiagnosticsReport {
    /// Network probes were skipped or every model answered.
    pub fn is_healthy(&self) -> bool {
        self.connectivity.as_ref().is_none_or(|report| report.success)
    }
}

/// Run every probe. With `skip_network` only the local checks run.
pub async fn run_diagnostics<T: Transport>(stack: &ClientStack<T>, skip_network: bool) -> DiagnosticsReport {
    let interference = check_for_interfering_software();

    let (backend_healthy, connectivity, redirect_protection) = if skip_network {
        (None, None, None)
    } else {
        (
            Some(test_backend_connection(&stack.api).await),
            Some(test_connectivity(&stack.ml).await),
            Some(test_redirect_protection(&stack.ml).await),
        )
    };

    DiagnosticsReport {
        development: stack.api.environment().development,
        backend_healthy,
        connectivity,
        redirect_protection,
        interference,
        guard: stack.transport.stats(),
    }
}
