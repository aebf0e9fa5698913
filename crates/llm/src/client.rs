//! LLM client abstraction and request/response types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System prompt (instructions, grounding rules)
    pub system: String,

    /// User prompt (question plus untrusted reference context)
    pub user: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling
    pub temperature: f32,
}

impl GenerationRequest {
    /// Create a request with default sampling parameters.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 900,
            temperature: 0.25,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text
    pub content: String,

    /// Model that actually produced the text
    pub model: String,
}

/// Why a provider attempt failed.
///
/// This is the only failure detail that crosses the component boundary;
/// raw provider error text stays in internal logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The attempt exceeded its per-call timeout
    Timeout,
    /// The backend rejected our credentials
    Auth,
    /// The backend reported quota/rate exhaustion
    Quota,
    /// Any other transport or response failure
    Upstream,
}

/// Provider-level failure for a single attempt.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider attempt timed out")]
    Timeout,

    #[error("provider rejected credentials: {0}")]
    Auth(String),

    #[error("provider quota exhausted: {0}")]
    Quota(String),

    #[error("provider upstream failure: {0}")]
    Upstream(String),
}

impl ProviderError {
    /// Collapse to the taxonomy kind recorded on the attempt.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Quota(_) => ErrorKind::Quota,
            Self::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

/// Trait for LLM backends.
///
/// Implementations must be cheap to share (`Arc<dyn LlmClient>`) and carry
/// their own identity so attribution can be computed from attempts alone.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name used in attribution (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Model identifier used in attribution.
    fn model_name(&self) -> &str;

    /// Perform a bounded, non-streaming completion.
    ///
    /// Implementations do their own HTTP timeouts where possible; the router
    /// additionally enforces a hard per-attempt deadline.
    async fn complete(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, ProviderError>;
}
