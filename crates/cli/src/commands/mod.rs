//! Command handlers for the Advisor CLI.

pub mod ask;
pub mod chat;
pub mod profile;
pub mod status;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use profile::ProfileCommand;
pub use status::StatusCommand;
