//! Ask command handler.
//!
//! One-shot question answering, optionally grounded in a resume file whose
//! profile is attached to a throwaway session for just this invocation.

use clap::Args;
use advisor_core::{AppError, AppResult};
use advisor_engine::{QueryOrchestrator, QueryReply, QueryRequest};
use std::path::PathBuf;

/// Ask one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub prompt: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "prompt")]
    pub file: Option<PathBuf>,

    /// Resume file to ground the answer in
    #[arg(short, long)]
    pub resume: Option<PathBuf>,

    /// Rate-limit identity (defaults to a single local key)
    #[arg(long, default_value = "local")]
    pub client_key: String,

    /// Output the full reply as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &advisor_core::AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.resolve_prompt()?;
        let engine = QueryOrchestrator::from_config(config)?;

        let session_id = if let Some(ref resume_path) = self.resume {
            let resume_text = std::fs::read_to_string(resume_path)?;
            let filename = resume_path.file_name().and_then(|n| n.to_str());
            let receipt = engine
                .upload_profile("ask-session", &resume_text, filename, &self.client_key)
                .map_err(|reason| {
                    AppError::Other(format!("Resume was not accepted: {:?}", reason))
                })?;
            tracing::debug!(
                "Profile stored for {} with {} skills",
                receipt.candidate_name,
                receipt.extracted_fields.len()
            );
            Some("ask-session".to_string())
        } else {
            None
        };

        let reply = engine
            .answer(QueryRequest {
                text: question,
                session_id,
                client_key: self.client_key.clone(),
            })
            .await;

        print_reply(&reply, self.json)?;
        Ok(())
    }

    /// The question text, from the positional argument or a file.
    fn resolve_prompt(&self) -> AppResult<String> {
        if let Some(ref prompt) = self.prompt {
            return Ok(prompt.clone());
        }
        if let Some(ref path) = self.file {
            return Ok(std::fs::read_to_string(path)?);
        }
        Err(AppError::Config(
            "No question provided. Pass it as an argument or via --file".to_string(),
        ))
    }
}

/// Render a reply to stdout, either human-readable or as JSON.
pub(crate) fn print_reply(reply: &QueryReply, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
        return Ok(());
    }

    match reply {
        QueryReply::Completed(outcome) => {
            println!("{}", outcome.answer_text);
            for source in &outcome.sources {
                if source.chunk_ids.is_empty() {
                    println!("\n[source: {} / {}]", source.provider_name, source.model_name);
                } else {
                    println!(
                        "\n[source: {} / {}; grounded in {}]",
                        source.provider_name,
                        source.model_name,
                        source.chunk_ids.join(", ")
                    );
                }
            }
        }
        QueryReply::Aborted(reason) => match reason {
            advisor_engine::AbortReason::RateLimitExceeded => {
                println!("Too many requests right now. Try again shortly.");
            }
            advisor_engine::AbortReason::ExfiltrationAttempt { message }
            | advisor_engine::AbortReason::InvalidInput { message }
            | advisor_engine::AbortReason::AllProvidersFailed { message } => {
                println!("{}", message);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(prompt: Option<&str>, file: Option<PathBuf>) -> AskCommand {
        AskCommand {
            prompt: prompt.map(str::to_string),
            file,
            resume: None,
            client_key: "local".to_string(),
            json: false,
        }
    }

    #[test]
    fn test_prompt_from_argument() {
        let cmd = command(Some("hello"), None);
        assert_eq!(cmd.resolve_prompt().unwrap(), "hello");
    }

    #[test]
    fn test_prompt_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.txt");
        std::fs::write(&path, "from file").unwrap();

        let cmd = command(None, Some(path));
        assert_eq!(cmd.resolve_prompt().unwrap(), "from file");
    }

    #[test]
    fn test_missing_prompt_is_an_error() {
        let cmd = command(None, None);
        assert!(cmd.resolve_prompt().is_err());
    }
}
