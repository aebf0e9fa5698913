//! Advisor Core Library
//!
//! Foundational utilities shared by every crate in the advisor workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - The immutable configuration snapshot (`AppConfig`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
