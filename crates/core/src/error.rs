//! Error types for the advisor service.
//!
//! This module defines a unified error enum covering the error categories of
//! the query pipeline: configuration, I/O, LLM transport, knowledge loading,
//! and serialization. Designed refusal outcomes (guard hits, rate denials)
//! are NOT errors and live in `advisor-engine` as ordinary values.

use thiserror::Error;

/// Unified error type for the advisor service.
///
/// All fallible functions return `Result<T, AppError>`. We never panic in
/// non-test code; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (internal detail; never surfaced verbatim to callers)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge store loading and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
