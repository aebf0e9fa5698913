//! Offline provider returning a fixed reply.
//!
//! Used as the `static` backend in provider order (keeps the pipeline
//! exercisable without network credentials) and by tests that need a
//! deterministic success.

use crate::client::{GenerationRequest, GenerationResponse, LlmClient, ProviderError};

/// Provider that always answers with a canned message.
pub struct StaticClient {
    reply: String,
}

impl StaticClient {
    /// Create a static backend with the given canned reply.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for StaticClient {
    fn default() -> Self {
        Self::new(
            "I can answer general career questions from the loaded knowledge base, \
             but no language-model backend is configured right now.",
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for StaticClient {
    fn provider_name(&self) -> &str {
        "static"
    }

    fn model_name(&self) -> &str {
        "canned-v1"
    }

    async fn complete(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        Ok(GenerationResponse {
            content: self.reply.clone(),
            model: self.model_name().to_string(),
        })
    }
}
