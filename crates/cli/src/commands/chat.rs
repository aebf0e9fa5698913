//! Chat command handler.
//!
//! Interactive loop that keeps one session alive, so an uploaded profile
//! informs every following question until it is cleared or the process ends.

use clap::Args;
use advisor_core::{AppConfig, AppResult};
use advisor_engine::{QueryOrchestrator, QueryRequest};
use std::io::{BufRead, Write};

use super::ask::print_reply;

const HELP: &str = "\
Commands:
  /upload <path>   attach a resume to this session
  /clear           forget the uploaded resume
  /status          show engine status
  /help            show this help
  /quit            exit
Anything else is asked as a question.";

/// Interactive advisor session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Rate-limit identity (defaults to a single local key)
    #[arg(long, default_value = "local")]
    pub client_key: String,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let engine = QueryOrchestrator::from_config(config)?;
        let session_id = "chat-session";

        println!("Advisor chat. Type /help for commands.");

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match line.split_once(' ').unwrap_or((line, "")) {
                ("/quit", _) | ("/exit", _) => break,
                ("/help", _) => println!("{}", HELP),
                ("/status", _) => {
                    let status = engine.status();
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
                ("/clear", _) => {
                    if engine.clear_profile(session_id) {
                        println!("Profile cleared.");
                    } else {
                        println!("No profile to clear.");
                    }
                }
                ("/upload", path) => {
                    let path = path.trim();
                    if path.is_empty() {
                        println!("Usage: /upload <path>");
                        continue;
                    }
                    self.upload(&engine, session_id, path);
                }
                _ => {
                    let reply = engine
                        .answer(QueryRequest {
                            text: line.to_string(),
                            session_id: Some(session_id.to_string()),
                            client_key: self.client_key.clone(),
                        })
                        .await;
                    print_reply(&reply, false)?;
                }
            }
        }

        println!("Bye.");
        Ok(())
    }

    fn upload(&self, engine: &QueryOrchestrator, session_id: &str, path: &str) {
        let resume_text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                println!("Could not read {}: {}", path, e);
                return;
            }
        };

        let filename = path.rsplit('/').next();
        match engine.upload_profile(session_id, &resume_text, filename, &self.client_key) {
            Ok(receipt) => {
                println!(
                    "Profile stored for {} ({} skills found).",
                    receipt.candidate_name,
                    receipt.extracted_fields.len()
                );
            }
            Err(reason) => println!("Resume was not accepted: {:?}", reason),
        }
    }
}
