use anyhow::Result;
use clap::{Parser, Subcommand};

use triqai::commands;
use triqai::config::Config;
use triqai::logging::init_tracing;

#[derive(Parser)]
#[command(name = "triqai")]
#[command(version)]
#[command(about = "TriqAI chat: conversations with a simulated Minecraft assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat,
    /// List all conversations, newest first
    List,
    /// Print a conversation transcript
    Show { id: String },
    /// Give a conversation a custom title
    Rename { id: String, title: String },
    /// Delete a conversation and its title
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.log_filter);

    match cli.command {
        None | Some(Commands::Chat) => commands::run_chat(&config).await,
        Some(Commands::List) => commands::list_conversations(&config).await,
        Some(Commands::Show { id }) => commands::show_conversation(&config, &id).await,
        Some(Commands::Rename { id, title }) => {
            commands::rename_conversation(&config, &id, &title).await
        }
        Some(Commands::Delete { id, yes }) => {
            commands::delete_conversation(&config, &id, yes).await
        }
    }
}
