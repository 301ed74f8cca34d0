use crate::client::RetryPolicy;

use std::time::Duration;

use serde::{Deserialize, Serialize};

const API_TIMEOUT_MS: u64 = 15_000;
const ML_TIMEOUT_MS: u64 = 30_000;
const ML_RETRY_ATTEMPTS: u32 = 2;
const ML_RETRY_DELAY_MS: u64 = 2_000;

/// Per-client request policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deadline for a single request; when it elapses the in-flight call is
    /// dropped and the caller gets a `timeout` error.
    pub timeout_ms: u64,

    /// Extra attempts the retry wrapper makes after the first failure.
    /// The base client never retries on its own.
    #[serde(default)]
    pub retry_attempts: u32,

    /// Fixed wait between retry attempts.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl ClientConfig {
    pub fn api() -> Self {
        Self {
            timeout_ms: API_TIMEOUT_MS,
            retry_attempts: 0,
            retry_delay_ms: 0,
        }
    }

    pub fn ml() -> Self {
        Self {
            timeout_ms: ML_TIMEOUT_MS,
            retry_attempts: ML_RETRY_ATTEMPTS,
            retry_delay_ms: ML_RETRY_DELAY_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::api()
    }
}
