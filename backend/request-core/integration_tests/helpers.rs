use request_core::config::ClientConfig;
use request_core::token_store::MemoryTokenStore;
use request_core::{AppConfig, ClientStack, HttpTransport};

use std::sync::Arc;

use wiremock::MockServer;

/// Production config pointed at a mock backend.
pub fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.transport.base_url = server.uri();
    config.ml = ClientConfig {
        retry_delay_ms: 0,
        ..ClientConfig::ml()
    };
    config
}

pub fn stack_for(config: &AppConfig) -> (ClientStack<HttpTransport>, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let transport = HttpTransport::new(&config.transport).expect("transport builds");
    let stack = ClientStack::with_transport(transport, config, tokens.clone());
    (stack, tokens)
}

/// Base URL of a port nothing listens on.
pub async fn closed_port_url() -> String {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);
    uri
}
