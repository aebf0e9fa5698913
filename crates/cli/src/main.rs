//! Advisor CLI
//!
//! Entry point for the career advisor command-line tool. One-shot questions
//! go through `ask`; `chat` keeps a session (and its uploaded profile) alive
//! for the lifetime of the process.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ProfileCommand, StatusCommand};
use advisor_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Advisor CLI - retrieval-grounded career guidance
#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Retrieval-grounded career guidance", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory of knowledge documents
    #[arg(short, long, global = true, env = "ADVISOR_KNOWLEDGE_DIR")]
    knowledge_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Provider priority order, comma-separated (huggingface, openai, static)
    #[arg(short, long, global = true, env = "ADVISOR_PROVIDER_ORDER")]
    providers: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question, optionally grounded in a resume
    Ask(AskCommand),

    /// Interactive session with profile upload and clearing
    Chat(ChatCommand),

    /// Inspect what would be extracted from a resume file
    Profile(ProfileCommand),

    /// Show knowledge base, session and provider status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.knowledge_dir,
        cli.config,
        cli.providers,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Advisor CLI starting");
    tracing::debug!("Knowledge dir: {:?}", config.knowledge_dir);
    tracing::debug!("Provider order: {:?}", config.provider_order);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Profile(_) => "profile",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Profile(cmd) => cmd.execute(),
        Commands::Status(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
