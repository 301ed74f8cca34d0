use super::ModelType;
use crate::error::ApiError;

use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{info, warn};

/// Fixed-delay retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// Run `operation` until it succeeds or `policy.attempts` retries are spent.
///
/// Every error kind is retried. The last error is returned, tagged with
/// `endpoint` and `model_type` when it lacks them.
pub async fn with_retry<R, F, Fut>(
    mut operation: F,
    policy: RetryPolicy,
    model_type: Option<ModelType>,
    endpoint: &str,
) -> Result<R, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
{
    let mut backoff = Constant::new(policy.delay);
    let mut remaining = policy.attempts;
    let label = model_type.map_or("api", |model| model.as_str());

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if remaining == 0 {
            warn!("{} operation on {} failed after retries: {}", label, endpoint, error);
            let error = error.with_endpoint(endpoint);
            return Err(match model_type {
                Some(model) => error.with_model_type(model),
                None => error,
            });
        }

        remaining -= 1;
        let delay = backoff.next_backoff().unwrap_or(policy.delay);
        info!(
            "Retrying {} operation on {} in {}ms ({} retries left): {}",
            label,
            endpoint,
            delay.as_millis(),
            remaining,
            error
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
