use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::Config;
use crate::events::{ConversationId, ConversationSummary, Route, SessionAction};
use crate::history::ConversationStore;
use crate::llm::CannedReplyProvider;
use crate::session::ConversationSession;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::ui::conversation::{ParsedCommand, SlashCommand, get_help_text, parse_slash_command};
use crate::ui::terminal::{format_entry, read_stdin_line};
use crate::ui::{Dialogs, TerminalDialogs, TerminalSurface};

/// Open the persistent conversation store described by `config`
pub fn open_store(config: &Config) -> Result<ConversationStore> {
    let path = config.storage_path();
    let kv = FileStore::open(&path)
        .with_context(|| format!("Failed to open conversation storage {}", path.display()))?;
    Ok(ConversationStore::new(Arc::new(kv), &config.ui))
}

fn parse_id(raw: &str) -> Result<ConversationId> {
    ConversationId::parse(raw)
        .or_else(|| raw.parse::<i64>().ok().map(ConversationId::from_millis))
        .with_context(|| format!("'{}' is not a conversation id", raw))
}

fn print_summaries(summaries: &[ConversationSummary]) {
    if summaries.is_empty() {
        println!("📭 No conversations yet. Run 'triqai chat' to start one!");
        return;
    }

    println!("💬 Your conversations:");
    println!("{}", "=".repeat(50));
    for summary in summaries {
        println!("  {:>4}  {}  ({})", summary.relative_time, summary.title, summary.id);
    }
}

pub async fn list_conversations(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    print_summaries(&store.list_all());
    Ok(())
}

pub async fn show_conversation(config: &Config, raw_id: &str) -> Result<()> {
    let store = open_store(config)?;
    let id = parse_id(raw_id)?;

    let Some(entries) = store.get_transcript(&id) else {
        println!("❌ Conversation '{}' not found.", id);
        println!("Run 'triqai list' to see available conversations.");
        return Ok(());
    };

    println!("💬 {}", store.get_title(&id));
    println!("{}", "=".repeat(50));
    for entry in &entries {
        println!("{}", format_entry(entry));
        println!();
    }
    Ok(())
}

pub async fn rename_conversation(config: &Config, raw_id: &str, title: &str) -> Result<()> {
    let store = open_store(config)?;
    let id = parse_id(raw_id)?;

    if !store.contains(&id) {
        println!("❌ Conversation '{}' not found.", id);
        return Ok(());
    }
    if title.trim().is_empty() {
        println!("❌ Title cannot be empty.");
        return Ok(());
    }

    store.set_title(&id, title.trim())?;
    println!("✅ Renamed {} to \"{}\"", id, title.trim());
    Ok(())
}

pub async fn delete_conversation(config: &Config, raw_id: &str, assume_yes: bool) -> Result<()> {
    let store = open_store(config)?;
    let id = parse_id(raw_id)?;

    if !store.contains(&id) {
        println!("❌ Conversation '{}' not found.", id);
        return Ok(());
    }

    let confirmed = assume_yes
        || TerminalDialogs
            .confirm(&format!("Delete \"{}\"? This cannot be undone.", store.get_title(&id)))
            .await;
    if !confirmed {
        println!("👋 Kept {}.", id);
        return Ok(());
    }

    store.delete_conversation(&id)?;
    println!("🗑️  Deleted {}.", id);
    Ok(())
}

/// Interactive chat, starting on the home page
pub async fn run_chat(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let suggestions = config.ui.suggestions.clone();

    let home = TerminalSurface::new(Route::Home, suggestions.clone());
    home.print_welcome();

    let session = ConversationSession::new(
        store,
        session_store,
        Box::new(home),
        Arc::new(TerminalDialogs),
        Arc::new(CannedReplyProvider::new(&config.reply)),
        &config.ui,
    );

    loop {
        print!("› ");
        io::stdout().flush()?;

        let Some(line) = read_stdin_line().await? else {
            break;
        };

        let outcome = match parse_slash_command(&line) {
            Some(command) if command.command == SlashCommand::Bye => break,
            Some(command) => handle_command(&session, command, &suggestions).await,
            None => session.send(&line).await,
        };

        let result = match outcome {
            Ok(action) => follow(&session, action, &suggestions).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Chat command failed");
            println!("❌ {:#}", e);
        }
    }

    println!("👋 Bye!");
    Ok(())
}

async fn handle_command(
    session: &ConversationSession,
    command: ParsedCommand,
    suggestions: &[String],
) -> Result<SessionAction> {
    match command.command {
        SlashCommand::New => session.create_new(),
        SlashCommand::List => {
            print_summaries(&session.history());
            Ok(SessionAction::None)
        }
        SlashCommand::Switch | SlashCommand::Rename | SlashCommand::Delete => {
            let Some(id) = command.conversation_target() else {
                println!("Usage: /{} <id>", command.command.command());
                return Ok(SessionAction::None);
            };
            if !session.store().contains(&id) {
                println!("❌ Conversation '{}' not found.", id);
                return Ok(SessionAction::None);
            }

            match command.command {
                SlashCommand::Switch => session.switch_to(&id),
                SlashCommand::Rename => {
                    if session.rename(&id).await? {
                        println!("✅ Renamed to \"{}\"", session.store().get_title(&id));
                    }
                    Ok(SessionAction::None)
                }
                _ => session.delete(&id).await,
            }
        }
        SlashCommand::Suggest => {
            let Some(text) = command.index_target().and_then(|i| suggestions.get(i)) else {
                println!("Usage: /suggest <1-{}>", suggestions.len());
                return Ok(SessionAction::None);
            };
            session.apply_suggestion(text);
            session.submit().await
        }
        SlashCommand::Copy => {
            match command.index_target().and_then(|i| session.copy_text(i)) {
                Some(text) => println!("{}", text),
                None => println!("Usage: /copy <n> (messages of the current conversation)"),
            }
            Ok(SessionAction::None)
        }
        SlashCommand::Help => {
            println!("{}", get_help_text());
            Ok(SessionAction::None)
        }
        SlashCommand::Bye => Ok(SessionAction::None),
    }
}

/// Carry out navigations requested by the session
async fn follow(
    session: &ConversationSession,
    mut action: SessionAction,
    suggestions: &[String],
) -> Result<()> {
    while let SessionAction::Navigate(route) = action {
        let surface = TerminalSurface::new(route, suggestions.to_vec());
        action = match route {
            Route::Chat => session.enter_chat_view(Box::new(surface)).await?,
            Route::Home => {
                surface.print_welcome();
                session.attach_surface(Box::new(surface));
                SessionAction::None
            }
        };
    }
    Ok(())
}
