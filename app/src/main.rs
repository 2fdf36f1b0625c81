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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    ChatArgs, ChatStrategy, CommandStrategy, ConversationAction, ConversationsStrategy,
    InfoStrategy, InitStrategy, MemoryAction, MemoryArgs, MemoryStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "souvenir")]
#[command(about = "French chat assistant that remembers what you tell it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (one message, or interactive without -m)
    Chat {
        /// Conversation to continue (a new one is created if omitted)
        #[arg(short = 'c', long)]
        conversation: Option<String>,

        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Image to attach
        #[arg(long)]
        image: Option<PathBuf>,

        /// PDF document to ask about
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Inspect and edit remembered facts
    Memory {
        /// Use the record shared by every conversation
        #[arg(long, global = true)]
        global: bool,

        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Manage stored conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationAction,
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
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            conversation,
            message,
            image,
            pdf,
        } => {
            ChatStrategy
                .execute(ChatArgs {
                    conversation_id: conversation,
                    message,
                    image,
                    pdf,
                })
                .await
        }
        Commands::Memory { global, action } => {
            MemoryStrategy.execute(MemoryArgs { global, action }).await
        }
        Commands::Conversations { action } => ConversationsStrategy.execute(action).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
