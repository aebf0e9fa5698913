//! Ordered provider fallback with accurate attribution.
//!
//! The router walks the configured backend list, gives every attempt a hard
//! deadline, and records a `ProviderAttempt` for each call. Attribution is a
//! pure function of the attempt list: whichever attempt succeeded is the
//! source of the answer, regardless of what the configured primary was.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{ErrorKind, GenerationRequest, LlmClient};

/// Record of one generation attempt against one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Backend identity
    pub provider_name: String,

    /// Model the backend was asked for
    pub model_name: String,

    /// Whether this attempt produced the answer
    pub succeeded: bool,

    /// Wall-clock latency of the attempt
    pub latency_ms: u64,

    /// Failure kind, present iff the attempt failed
    pub error_kind: Option<ErrorKind>,
}

/// A routed generation: the answer plus the full attempt history.
#[derive(Debug, Clone)]
pub struct Routed {
    /// Generated answer text
    pub answer: String,

    /// Model identity reported by the winning backend
    pub model: String,

    /// Every attempt made for this request, in order
    pub attempts: Vec<ProviderAttempt>,
}

/// Terminal failure: every backend in the priority list failed.
///
/// Carries the attempt list for internal logging; callers must surface only
/// a generic message, never the per-provider detail.
#[derive(Error, Debug)]
#[error("all providers failed after {} attempts", attempts.len())]
pub struct AllProvidersFailed {
    pub attempts: Vec<ProviderAttempt>,
}

/// Tries an ordered list of LLM backends until one answers.
pub struct ProviderRouter {
    clients: Vec<Arc<dyn LlmClient>>,
    attempt_timeout: Duration,
}

impl ProviderRouter {
    /// Build a router over an ordered backend list.
    pub fn new(clients: Vec<Arc<dyn LlmClient>>, attempt_timeout: Duration) -> Self {
        Self {
            clients,
            attempt_timeout,
        }
    }

    /// Number of configured backends.
    pub fn provider_count(&self) -> usize {
        self.clients.len()
    }

    /// Names of configured backends, priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.provider_name()).collect()
    }

    /// Generate an answer, falling back through the priority list.
    ///
    /// Each attempt is bounded by the router's timeout; a slow backend never
    /// delays the move to the next one beyond that deadline. The in-flight
    /// call to a timed-out backend is dropped and its eventual result
    /// discarded.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Routed, AllProvidersFailed> {
        let mut attempts = Vec::with_capacity(self.clients.len());

        for client in &self.clients {
            let start = Instant::now();
            let outcome = tokio::time::timeout(self.attempt_timeout, client.complete(request)).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(Ok(response)) => {
                    tracing::info!(
                        provider = client.provider_name(),
                        latency_ms,
                        "provider answered"
                    );
                    attempts.push(ProviderAttempt {
                        provider_name: client.provider_name().to_string(),
                        model_name: client.model_name().to_string(),
                        succeeded: true,
                        latency_ms,
                        error_kind: None,
                    });
                    return Ok(Routed {
                        answer: response.content,
                        model: response.model,
                        attempts,
                    });
                }
                Ok(Err(err)) => {
                    // Raw error text is internal diagnostic detail only.
                    tracing::warn!(
                        provider = client.provider_name(),
                        latency_ms,
                        error = %err,
                        "provider attempt failed, trying next"
                    );
                    attempts.push(ProviderAttempt {
                        provider_name: client.provider_name().to_string(),
                        model_name: client.model_name().to_string(),
                        succeeded: false,
                        latency_ms,
                        error_kind: Some(err.kind()),
                    });
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        provider = client.provider_name(),
                        timeout_ms = self.attempt_timeout.as_millis() as u64,
                        "provider attempt timed out, trying next"
                    );
                    attempts.push(ProviderAttempt {
                        provider_name: client.provider_name().to_string(),
                        model_name: client.model_name().to_string(),
                        succeeded: false,
                        latency_ms,
                        error_kind: Some(ErrorKind::Timeout),
                    });
                }
            }
        }

        Err(AllProvidersFailed { attempts })
    }
}

/// Attribution from an attempt list: the successful attempt's identity.
///
/// Pure function so the invariant "sources reflect the actual answering
/// backend" is testable without any router state.
pub fn attribution(attempts: &[ProviderAttempt]) -> Option<(&str, &str)> {
    attempts
        .iter()
        .rev()
        .find(|a| a.succeeded)
        .map(|a| (a.provider_name.as_str(), a.model_name.as_str()))
}
