use super::mock_data::mock_vpn_status;
use super::{ServiceData, or_fallback};
use crate::client::ApiClient;
use crate::transport::Transport;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnStatus {
    pub connected: bool,
    #[serde(default)]
    pub server_ip: Option<String>,
    #[serde(default)]
    pub server_location: Option<String>,
    pub recommended_server: String,
    #[serde(default)]
    pub connection_time: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

pub struct VpnService<T> {
    client: ApiClient<T>,
}

impl<T: Transport> VpnService<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }

    /// Skips the status call entirely when the health check fails.
    pub async fn get_status(&self) -> ServiceData<VpnStatus> {
        if !self.client.health().await {
            warn!("Backend unhealthy, using mock VPN status");
            return ServiceData::mock(mock_vpn_status(), "backend health check failed");
        }
        or_fallback(self.client.get("/vpn/status").await, "VPN status", mock_vpn_status)
    }
}
