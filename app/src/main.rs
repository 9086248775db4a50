#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod command;
mod render;

use command::{
    AskInput, AskStrategy, ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy,
    ParseInput, ParseStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront shopping assistant", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant interactively
    Chat {
        /// Assistant endpoint (overrides config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Send a single message and print the reply
    Ask {
        /// Message to send
        #[arg(short = 'm', long)]
        message: String,

        /// Assistant endpoint (overrides config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Parse a raw assistant reply from a file or stdin
    Parse {
        /// File holding the reply (stdin when omitted)
        file: Option<PathBuf>,

        /// Print the structured result as JSON
        #[arg(long)]
        json: bool,

        /// Product page origin (overrides config)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Chat { endpoint } => ChatStrategy.execute(ChatInput { endpoint }).await,
        Commands::Ask { message, endpoint } => {
            AskStrategy
                .execute(AskInput { message, endpoint })
                .await
        }
        Commands::Parse {
            file,
            json,
            base_url,
        } => {
            ParseStrategy
                .execute(ParseInput {
                    file,
                    json,
                    base_url,
                })
                .await
        }
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
