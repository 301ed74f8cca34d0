use super::ml_models::{
    DetectedGamesResponse, GameOptimizationOptions, OptimizeGameResponse,
    PerformancePredictorResponse, RouteOptimizationParams, RouteOptimizerResponse,
};
use super::response::decode_response;
use super::{ApiClient, ModelType, RequestOptions, RetryPolicy, normalize_endpoint, with_retry};
use crate::error::ApiError;
use crate::transport::{RawResponse, Transport};
use crate::url_guard::is_absolute;
use crate::{CLIENT_SOURCE, ML_API_PREFIX, ML_PROXY_PREFIX};

use log::{debug, error, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

/// Rewrite any ML endpoint to `/api/ml/<rest>`.
///
/// `/ml/x`, `/api/ml/x`, `x` and `/x` all become `/api/ml/x`.
pub fn ml_endpoint(endpoint: &str) -> String {
    let path = normalize_endpoint(endpoint);
    let rest = match path.strip_prefix(ML_PROXY_PREFIX) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => &path[1..],
    };
    format!("{}{}", ML_API_PREFIX, rest)
}

/// Path component only, query and fragment dropped.
fn path_of(url: &str) -> String {
    if is_absolute(url) {
        if let Ok(parsed) = Url::parse(url) {
            return parsed.path().to_string();
        }
    }
    url.split(['?', '#']).next().unwrap_or_default().to_string()
}

fn to_body<B: Serialize>(endpoint: &str, body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::decode(endpoint, e.to_string()))
}

/// Client for the ML inference endpoints.
///
/// Longer deadline, model-tagged headers, strict redirect validation and a
/// fixed-delay retry around the named operations.
pub struct MlClient<T> {
    api: ApiClient<T>,
    retry: RetryPolicy,
}

impl<T> Clone for MlClient<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            retry: self.retry,
        }
    }
}

impl<T: Transport> MlClient<T> {
    /// The retry policy comes from the client's config.
    pub fn new(api: ApiClient<T>) -> Self {
        let retry = api.config().retry_policy();
        Self { api, retry }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn request<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        model_type: ModelType,
    ) -> Result<R, ApiError> {
        let path = ml_endpoint(endpoint);
        self.dispatch(&path, options, model_type)
            .await
            .map_err(|e| e.with_model_type(model_type))
    }

    async fn dispatch<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        model_type: ModelType,
    ) -> Result<R, ApiError> {
        if self.api.environment().development {
            debug!("ML request [{}]: {} {}", model_type, options.method, path);
        }

        let mut request = self.api.build(path, &options)?.ml(Some(model_type));
        request.set_header("X-ML-Operation", "1");
        request.set_header("X-ML-Model-Type", model_type.as_str());
        request.set_default_header("X-ML-Client", CLIENT_SOURCE);

        let response = self.api.execute(request).await?;
        self.validate_redirect(path, &response)?;
        decode_response(&response, path)
    }

    fn validate_redirect(&self, path: &str, response: &RawResponse) -> Result<(), ApiError> {
        if let Some(domain) = self.api.environment().disallowed_domain_in(&response.url) {
            error!("ML response redirected to disallowed domain {}: {}", domain, response.url);
            return Err(ApiError::redirect_blocked(
                path,
                format!("ML response URL points at disallowed domain {}", domain),
            ));
        }

        let responded = path_of(&response.url);
        if !response.url.is_empty() && responded != path_of(path) {
            error!("ML response path changed: {} -> {}", path, response.url);
            return Err(ApiError::redirect_blocked(
                path,
                format!("ML response came from a different path: {}", response.url),
            ));
        }

        Ok(())
    }

    /// [`with_retry`] under this client's policy.
    pub async fn with_retry<R, F, Fut>(
        &self,
        operation: F,
        model_type: ModelType,
        endpoint: &str,
    ) -> Result<R, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        with_retry(operation, self.retry, Some(model_type), endpoint).await
    }

    async fn retrying<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        model_type: ModelType,
    ) -> Result<R, ApiError> {
        let path = ml_endpoint(endpoint);
        self.with_retry(
            || self.request(&path, options.clone(), model_type),
            model_type,
            &path,
        )
        .await
    }

    pub async fn optimize_routes(
        &self,
        game_id: &str,
        params: &RouteOptimizationParams,
    ) -> Result<RouteOptimizerResponse, ApiError> {
        let endpoint = format!("/ml/route-optimizer/{}", game_id);
        let body = to_body(&endpoint, params)?;
        self.retrying(&endpoint, RequestOptions::post(body), ModelType::RouteOptimizer)
            .await
    }

    pub async fn predict_performance(
        &self,
        game_id: &str,
        system_specs: Value,
    ) -> Result<PerformancePredictorResponse, ApiError> {
        let endpoint = format!("/ml/performance-predictor/{}", game_id);
        let body = json!({ "systemSpecs": system_specs });
        self.retrying(&endpoint, RequestOptions::post(body), ModelType::PerformancePredictor)
            .await
    }

    pub async fn detect_games(&self) -> Result<DetectedGamesResponse, ApiError> {
        self.retrying("/ml/game-detection", RequestOptions::get(), ModelType::GameDetection)
            .await
    }

    pub async fn optimize_game(
        &self,
        game_id: &str,
        options: &GameOptimizationOptions,
    ) -> Result<OptimizeGameResponse, ApiError> {
        info!("Starting ML optimization for game {}", game_id);
        let endpoint = format!("/ml/optimize-game/{}", game_id);
        let body = to_body(&endpoint, options)?;
        self.retrying(&endpoint, RequestOptions::post(body), ModelType::GameOptimization)
            .await
    }
}
