//! OpenAI-compatible chat-completions provider.
//!
//! Both supported hosted backends speak the same wire format, so one client
//! covers them: OpenAI directly, and the Hugging Face inference router via
//! its OpenAI-compatible endpoint.

use crate::client::{GenerationRequest, GenerationResponse, LlmClient, ProviderError};
use advisor_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Chat completions API request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat completions API response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body shape shared by both backends.
#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    #[serde(default)]
    error: Option<ChatErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions backend.
pub struct ChatCompletionsClient {
    provider: &'static str,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Client for the OpenAI API.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn openai(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Self::with_base_url("openai", OPENAI_BASE_URL, api_key, model, timeout)
    }

    /// Client for the Hugging Face inference router.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn huggingface(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Self::with_base_url("huggingface", HUGGINGFACE_BASE_URL, api_key, model, timeout)
    }

    /// Client against a custom endpoint (used by tests and self-hosted gateways).
    pub fn with_base_url(
        provider: &'static str,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    fn to_chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    fn provider_name(&self) -> &str {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        tracing::debug!("Sending completion request to {}", self.provider);

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ChatErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(classify_status(status, detail));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("Malformed response body: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::Upstream("Response carried no content".to_string()))?;

        tracing::debug!("Received completion from {}", self.provider);

        Ok(GenerationResponse {
            content,
            model: chat.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

/// Map transport-level reqwest failures to the provider taxonomy.
fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Upstream(err.to_string())
    }
}

/// Map HTTP status codes to the provider taxonomy.
fn classify_status(status: reqwest::StatusCode, detail: String) -> ProviderError {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
            ProviderError::Quota(detail)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,
        _ => ProviderError::Upstream(detail),
    }
}
