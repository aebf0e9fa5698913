//! LLM integration crate for the advisor service.
//!
//! Provider-agnostic abstraction over LLM backends plus the fallback router.
//! The router tries backends in configured priority order, records one
//! `ProviderAttempt` per call, and computes answer attribution strictly from
//! the attempt list, never from static configuration.
//!
//! # Providers
//! - **huggingface**: Hugging Face inference router (OpenAI-compatible API)
//! - **openai**: OpenAI chat completions
//! - **static**: offline canned-answer backend, used by tests and as a
//!   last-resort fallback

pub mod client;
pub mod factory;
pub mod providers;
pub mod router;

// Re-export main types
pub use client::{ErrorKind, GenerationRequest, GenerationResponse, LlmClient, ProviderError};
pub use factory::{build_router, create_client};
pub use router::{AllProvidersFailed, ProviderAttempt, ProviderRouter, Routed};
