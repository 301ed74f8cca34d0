use super::{RawResponse, RequestDescriptor, Transport};
use crate::error::ApiError;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// One scripted reaction of [`StubTransport`].
#[derive(Debug, Clone)]
pub enum StubOutcome {
    Respond(RawResponse),
    /// Settle with a `network` error carrying this message.
    Fail(String),
    /// Never settle.
    Hang,
}

/// Scripted transport for tests.
///
/// Outcomes are consumed in order; once the queue is empty the `otherwise`
/// outcome (if any) repeats. Every request is recorded as it arrives.
#[derive(Debug, Default)]
pub struct StubTransport {
    script: Mutex<VecDeque<StubOutcome>>,
    otherwise: Mutex<Option<StubOutcome>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: RawResponse) -> Self {
        self.push(StubOutcome::Respond(response));
        self
    }

    pub fn respond_json(self, status: u16, body: serde_json::Value) -> Self {
        self.respond(RawResponse::json(status, &body))
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(StubOutcome::Fail(message.into()));
        self
    }

    pub fn hang(self) -> Self {
        self.push(StubOutcome::Hang);
        self
    }

    /// Outcome repeated once the script runs out.
    pub fn otherwise(self, outcome: StubOutcome) -> Self {
        *lock(&self.otherwise) = Some(outcome);
        self
    }

    pub fn push(&self, outcome: StubOutcome) {
        lock(&self.script).push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        lock(&self.requests).clone()
    }

    /// Requests whose URL starts with `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|request| request.url.starts_with(path))
            .count()
    }

    fn next_outcome(&self, request: &RequestDescriptor) -> Option<StubOutcome> {
        lock(&self.requests).push(request.clone());
        lock(&self.script)
            .pop_front()
            .or_else(|| lock(&self.otherwise).clone())
    }
}

impl Transport for StubTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, ApiError> {
        match self.next_outcome(&request) {
            Some(StubOutcome::Respond(mut response)) => {
                if response.url.is_empty() {
                    response.url = request.url;
                }
                Ok(response)
            }
            Some(StubOutcome::Fail(message)) => Err(ApiError::network(request.url, message)),
            Some(StubOutcome::Hang) => std::future::pending().await,
            None => Err(ApiError::network(request.url, "stub transport has no scripted outcome")),
        }
    }
}
