//! LLM provider implementations.

mod chat_completions;
mod fixed;

pub use chat_completions::ChatCompletionsClient;
pub use fixed::StaticClient;
