//! DocRouter CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `doctor`  — Check config and credentials
//! - `index`   — Process documents and inspect their tools
//! - `chat`    — Process documents, then ask questions about them

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docrouter",
    about = "DocRouter — ask questions across many documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Diagnose configuration and credentials
    Doctor,

    /// Process documents and list the tools built for them
    Index {
        /// A document as NAME=PATH; repeat for several
        #[arg(short, long = "doc", value_name = "NAME=PATH", required = true)]
        docs: Vec<String>,

        /// Show which tools would be offered for this question
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Ask questions about documents
    Chat {
        /// A document as NAME=PATH; repeat for several
        #[arg(short, long = "doc", value_name = "NAME=PATH", required = true)]
        docs: Vec<String>,

        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Index { docs, query } => commands::index::run(docs, query).await?,
        Commands::Chat { docs, message } => commands::chat::run(docs, message).await?,
    }

    Ok(())
}
