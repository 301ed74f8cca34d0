//! Domain services at the fallback boundary: any request error becomes fixed
//! mock data plus a notice, never an error for the caller.

pub mod games;
pub mod mock_data;
pub mod vpn;

pub use games::{Game, GameOptimizationResult, GamesService};
pub use vpn::{VpnService, VpnStatus};

use crate::error::ApiError;

use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Live,
    /// Substituted after a request failure; `reason` is the operator notice.
    Mock { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceData<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> ServiceData<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }

    pub fn mock(data: T, reason: impl Into<String>) -> Self {
        Self {
            data,
            source: DataSource::Mock {
                reason: reason.into(),
            },
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.source, DataSource::Mock { .. })
    }
}

/// Live data on success, `fallback()` on any error.
pub(crate) fn or_fallback<T>(
    result: Result<T, ApiError>,
    what: &str,
    fallback: impl FnOnce() -> T,
) -> ServiceData<T> {
    match result {
        Ok(data) => ServiceData::live(data),
        Err(e) => {
            warn!("Using mock {} after {} error: {}", what, e.kind(), e);
            ServiceData::mock(fallback(), format!("{} unavailable ({})", what, e.kind()))
        }
    }
}
