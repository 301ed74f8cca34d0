mod api_error;
mod client_ml;
mod config;
mod transport_guard;

use crate::client::ApiClient;
use crate::config::{ClientConfig, EnvironmentConfig};
use crate::token_store::MemoryTokenStore;
use crate::transport::StubTransport;

use std::sync::Arc;

/// Unguarded client over a stub, with its token store exposed.
pub(crate) fn stub_client(
    stub: StubTransport,
    environment: EnvironmentConfig,
    config: ClientConfig,
) -> (ApiClient<StubTransport>, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = ApiClient::new(
        Arc::new(stub),
        tokens.clone(),
        config,
        Arc::new(environment),
    );
    (client, tokens)
}
