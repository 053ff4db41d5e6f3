//! Docent CLI, the main entry point.
//!
//! Commands:
//! - `onboard` : write the default config
//! - `serve`   : start the HTTP API
//! - `chat`    : interactive question/answer session ending in a quiz
//! - `search`  : print the passages the index returns for a query
//! - `doctor`  : diagnose config, provider and corpus

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docent",
    about = "Docent: chat with your documents, then get quizzed on the conversation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config.toml (defaults to ~/.docent/config.toml)
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Onboard,

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask questions interactively; the end keyword prints a quiz
    Chat {
        /// Override the corpus paths (repeatable)
        #[arg(long)]
        corpus: Vec<PathBuf>,
    },

    /// Search the document index
    Search {
        /// Query text
        query: String,

        /// Number of passages to return
        #[arg(short, default_value_t = 3)]
        k: usize,
    },

    /// Diagnose configuration, provider and corpus
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Chat { corpus } => commands::chat::run(config_path, corpus).await?,
        Commands::Search { query, k } => commands::search::run(config_path, &query, k).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
