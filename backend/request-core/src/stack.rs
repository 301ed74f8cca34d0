//! Wiring: one guarded transport shared by the base and ML clients.

use crate::client::{ApiClient, MlClient};
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::transport::{GuardedTransport, HttpTransport, Transport};
use crate::url_guard::RedirectDetector;

use std::sync::Arc;

use log::info;

pub struct ClientStack<T> {
    pub transport: Arc<GuardedTransport<T>>,
    pub api: ApiClient<GuardedTransport<T>>,
    pub ml: MlClient<GuardedTransport<T>>,
}

impl ClientStack<HttpTransport> {
    /// Real network stack. Tokens persist to `config.tokens.path` when set.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let tokens: Arc<dyn TokenStore> = match &config.tokens.path {
            Some(path) => Arc::new(FileTokenStore::open(path)?),
            None => Arc::new(MemoryTokenStore::new()),
        };
        let transport = HttpTransport::new(&config.transport)?;
        info!("Request stack targeting {}", transport.base_url());

        Ok(Self::with_transport(transport, config, tokens))
    }
}

impl<T: Transport> ClientStack<T> {
    pub fn with_transport(inner: T, config: &AppConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let environment = Arc::new(config.environment.clone());
        let detector = RedirectDetector::new(Arc::clone(&environment));
        let transport = Arc::new(GuardedTransport::new(inner, detector));

        let api = ApiClient::new(Arc::clone(&transport), tokens, config.api, environment);
        let ml = MlClient::new(api.with_config(config.ml));

        Self { transport, api, ml }
    }
}
