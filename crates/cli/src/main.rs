//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `send`     — One turn: send a message, print the answer
//! - `chat`     — Interactive chat on stdin
//! - `sessions` — List known session ids
//! - `history`  — Print a session transcript
//! - `tools`    — List the built-in tools
//! - `init`     — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — a tool-using chat assistant with persistent sessions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.parley/config.toml)
    #[arg(short, long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the answer
    Send {
        /// Session to continue (a new one is created if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// The message text
        message: String,
    },

    /// Chat interactively
    Chat {
        /// Session to resume
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List known sessions
    Sessions,

    /// Print the transcript of a session
    History {
        #[arg(short, long)]
        session: String,
    },

    /// List the built-in tools
    Tools,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Send { session, message } => {
            commands::send::run(config_path, session, message).await?
        }
        Commands::Chat { session } => commands::chat::run(config_path, session).await?,
        Commands::Sessions => commands::sessions::run(config_path).await?,
        Commands::History { session } => commands::history::run(config_path, session).await?,
        Commands::Tools => commands::tools::run(config_path)?,
        Commands::Init { force } => commands::init::run(config_path, force)?,
    }

    Ok(())
}
