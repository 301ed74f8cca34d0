use super::RequestOptions;
use super::response::decode_response;
use crate::config::{ClientConfig, EnvironmentConfig};
use crate::error::ApiError;
use crate::token_store::{TokenKind, TokenStore};
use crate::transport::{JSON_CONTENT_TYPE, Method, RawResponse, RequestDescriptor, Transport};
use crate::{API_PROXY_PREFIX, CLIENT_SOURCE};

use common::RedactedToken;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const REFRESH_ENDPOINT: &str = "/auth/refresh-token";
pub const HEALTH_ENDPOINT: &str = "/health";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Leading `/`, every leading `/api` segment removed.
///
/// The transport already scopes calls to the API origin, so `/api/games`,
/// `api/games` and `/api/api/games` all become `/games`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let mut path = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{}", endpoint)
    };

    loop {
        match path.strip_prefix(API_PROXY_PREFIX) {
            Some("") => return "/".to_string(),
            Some(rest) if rest.starts_with('/') => path = rest.to_string(),
            _ => return path,
        }
    }
}

/// JSON client for the backend API.
pub struct ApiClient<T> {
    transport: Arc<T>,
    tokens: Arc<dyn TokenStore>,
    config: ClientConfig,
    environment: Arc<EnvironmentConfig>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tokens: Arc::clone(&self.tokens),
            config: self.config,
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(
        transport: Arc<T>,
        tokens: Arc<dyn TokenStore>,
        config: ClientConfig,
        environment: Arc<EnvironmentConfig>,
    ) -> Self {
        Self {
            transport,
            tokens,
            config,
            environment,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn environment(&self) -> &Arc<EnvironmentConfig> {
        &self.environment
    }

    /// Same transport, tokens and environment under a different request policy.
    pub fn with_config(&self, config: ClientConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post<R: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<R, ApiError> {
        self.request(endpoint, RequestOptions::post(body)).await
    }

    pub async fn request<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let path = normalize_endpoint(endpoint);
        if self.environment.development {
            debug!("API request: {} {}", options.method, path);
        }

        let mut response = self.execute(self.build(&path, &options)?).await?;

        // One refresh, one retry. A second 401 is final.
        if response.status.is_unauthorized() && self.tokens.get(TokenKind::Refresh).is_some() {
            info!("Access token rejected for {}, attempting refresh", path);
            if self.refresh_access_token().await {
                response = self.execute(self.build(&path, &options)?).await?;
                if response.status.is_unauthorized() {
                    warn!("Still unauthorized after token refresh: {}", path);
                    self.discard_access_token();
                }
            } else {
                self.discard_access_token();
            }
        }

        decode_response(&response, &path)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns whether a new access token was stored.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh_token) = self.tokens.get(TokenKind::Refresh) else {
            return false;
        };

        let body = json!({ "refresh_token": refresh_token.expose() });
        let request = match serde_json::to_vec(&body) {
            Ok(bytes) => RequestDescriptor::new(Method::POST, REFRESH_ENDPOINT)
                .with_headers(&self.base_headers())
                .with_body(bytes)
                .with_timeout(self.config.timeout()),
            Err(e) => {
                warn!("Failed to encode refresh request: {}", e);
                return false;
            }
        };

        let refreshed = match self.execute(request).await {
            Ok(response) => decode_response::<RefreshResponse>(&response, REFRESH_ENDPOINT),
            Err(e) => Err(e),
        };

        match refreshed {
            Ok(tokens) => {
                let stored = self.store_tokens(
                    RedactedToken::new(tokens.access_token),
                    tokens.refresh_token.map(RedactedToken::new),
                );
                if stored {
                    info!("Access token refreshed");
                }
                stored
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                false
            }
        }
    }

    /// Store tokens issued at login.
    pub fn login(&self, access_token: RedactedToken, refresh_token: Option<RedactedToken>) -> bool {
        self.store_tokens(access_token, refresh_token)
    }

    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear tokens on logout: {}", e);
        }
    }

    /// `GET /health` with a short deadline; any 2xx is healthy.
    pub async fn health(&self) -> bool {
        let request = RequestDescriptor::get(HEALTH_ENDPOINT)
            .with_headers(&self.base_headers())
            .with_timeout(HEALTH_TIMEOUT);

        match self.execute(request).await {
            Ok(response) => response.status.is_success(),
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Dispatch with the request's own deadline. The transport future is
    /// dropped when the deadline passes.
    pub(crate) async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, ApiError> {
        let deadline = request.timeout;
        let endpoint = request.url.clone();
        let model_type = request.model_type;

        match tokio::time::timeout(deadline, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Request to {} timed out after {}ms", endpoint, deadline.as_millis());
                let error = ApiError::timeout(endpoint, deadline);
                Err(match model_type {
                    Some(model) => error.with_model_type(model),
                    None => error,
                })
            }
        }
    }

    pub(crate) fn build(&self, path: &str, options: &RequestOptions) -> Result<RequestDescriptor, ApiError> {
        let mut headers = self.base_headers();
        headers.extend(options.headers.clone());

        let mut request = RequestDescriptor::new(options.method.clone(), path)
            .with_headers(&headers)
            .with_timeout(options.timeout.unwrap_or_else(|| self.config.timeout()));

        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::decode(path, e.to_string()))?;
            request = request.with_body(bytes);
        }

        Ok(request)
    }

    /// Content negotiation, redirect marker, client identity, development
    /// marker and the bearer token when one is stored.
    pub(crate) fn base_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert("accept".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert("x-no-redirect".to_string(), "1".to_string());
        headers.insert("x-client-source".to_string(), CLIENT_SOURCE.to_string());
        if self.environment.development {
            headers.insert("x-development-mode".to_string(), "1".to_string());
        }
        if let Some(token) = self.tokens.get(TokenKind::Access).filter(|t| !t.is_empty()) {
            headers.insert("authorization".to_string(), token.bearer());
        }
        headers
    }

    fn store_tokens(&self, access_token: RedactedToken, refresh_token: Option<RedactedToken>) -> bool {
        debug!("Storing access token ({} chars)", access_token.len());
        if let Err(e) = self.tokens.set(TokenKind::Access, access_token) {
            warn!("Failed to store access token: {}", e);
            return false;
        }
        if let Some(refresh_token) = refresh_token {
            if let Err(e) = self.tokens.set(TokenKind::Refresh, refresh_token) {
                warn!("Failed to store refresh token: {}", e);
            }
        }
        true
    }

    fn discard_access_token(&self) {
        if let Err(e) = self.tokens.remove(TokenKind::Access) {
            warn!("Failed to discard rejected access token: {}", e);
        }
    }
}
