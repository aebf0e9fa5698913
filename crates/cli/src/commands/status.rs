//! Status command handler.

use clap::Args;
use advisor_core::{AppConfig, AppResult};
use advisor_engine::QueryOrchestrator;

/// Show engine status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    /// Execute the status command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let engine = QueryOrchestrator::from_config(config)?;
        let status = engine.status();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("Documents:  {}", status.documents);
            println!("Chunks:     {}", status.chunks);
            println!("Sessions:   {}", status.live_sessions);
            println!("Providers:  {}", status.providers.join(" -> "));
        }
        Ok(())
    }
}
