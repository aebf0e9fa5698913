//! Profile command handler.
//!
//! Dry-run resume extraction: shows the name and skills that would be
//! attached to a session, without touching providers or session state.

use clap::Args;
use advisor_core::{AppError, AppResult};
use advisor_engine::profile::profile_from_text;
use std::path::PathBuf;

/// Inspect resume extraction
#[derive(Args, Debug)]
pub struct ProfileCommand {
    /// Resume file to inspect
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProfileCommand {
    /// Execute the profile command.
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing profile command");

        let resume_text = std::fs::read_to_string(&self.file)?;
        let filename = self.file.file_name().and_then(|n| n.to_str());

        let profile = profile_from_text("inspect", &resume_text, filename).ok_or_else(|| {
            AppError::Other(format!("{:?} contains no resume text", self.file))
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
        } else {
            println!("Candidate: {}", profile.candidate_name);
            if profile.extracted_fields.is_empty() {
                println!("Skills:    (none found)");
            } else {
                println!("Skills:    {}", profile.extracted_fields.join(", "));
            }
        }
        Ok(())
    }
}
