//! Line-oriented terminal rendering of the chat pages

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::events::{ConversationEntry, ConversationRole, ConversationSummary, Route};
use crate::ui::{ChatSurface, Dialogs};

/// Chat page (or home page) printed to stdout
pub struct TerminalSurface {
    route: Route,
    input: String,
    typing: bool,
    suggestions: Vec<String>,
}

impl TerminalSurface {
    pub fn new(route: Route, suggestions: Vec<String>) -> Self {
        Self {
            route,
            input: String::new(),
            typing: false,
            suggestions,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Print the welcome screen with numbered suggestion shortcuts
    pub fn print_welcome(&self) {
        println!("🎮 Welcome to TriqAI (beta)");
        println!("{}", "=".repeat(50));
        if !self.suggestions.is_empty() {
            println!("💡 Try one of these (/suggest <n>):");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                println!("   {}. {}", i + 1, suggestion);
            }
        }
        println!("Type a message and press Enter. /help lists commands.");
        println!();
    }

    fn role_icon(role: ConversationRole) -> &'static str {
        match role {
            ConversationRole::User => "👤",
            ConversationRole::Assistant => "🤖",
        }
    }
}

/// Render a single entry the way the terminal chat shows it
pub fn format_entry(entry: &ConversationEntry) -> String {
    let timestamp = entry.timestamp.format("%H:%M:%S");
    let header = format!(
        "{} {} {} {}",
        TerminalSurface::role_icon(entry.role),
        entry.role.display_name(),
        timestamp,
        "─".repeat(20)
    );

    let body: Vec<String> = entry
        .content
        .lines()
        .map(|line| format!("  {}", line))
        .collect();

    format!("{}\n{}", header, body.join("\n"))
}

impl ChatSurface for TerminalSurface {
    fn has_transcript_view(&self) -> bool {
        self.route == Route::Chat
    }

    fn read_input(&self) -> String {
        self.input.clone()
    }

    fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        println!("✏️  {}", text);
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn clear_transcript(&mut self) {
        println!();
        println!("{}", "─".repeat(50));
    }

    fn append_message(&mut self, entry: &ConversationEntry, _markup: &str) {
        println!("{}", format_entry(entry));
        println!();
    }

    fn set_typing(&mut self, typing: bool) {
        if typing && !self.typing {
            println!("🤖 TriqAI is typing...");
        }
        self.typing = typing;
    }

    fn scroll_to_bottom(&mut self) {
        let _ = io::stdout().flush();
    }

    fn render_history(&mut self, _entries: &[ConversationSummary]) {
        // History is printed on demand with /list
    }
}

/// Read one line from stdin off the async runtime.
///
/// `Ok(None)` at end of input; the line terminator is stripped.
pub async fn read_stdin_line() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| read_trimmed_line(&mut io::stdin().lock()))
        .await
        .map_err(io::Error::other)?
}

fn read_trimmed_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Dialogs answered on stdin
pub struct TerminalDialogs;

impl TerminalDialogs {
    async fn read_line() -> Option<String> {
        read_stdin_line().await.ok().flatten()
    }
}

#[async_trait]
impl Dialogs for TerminalDialogs {
    async fn confirm(&self, message: &str) -> bool {
        print!("❓ {} [y/N] ", message);
        let _ = io::stdout().flush();
        matches!(
            Self::read_line().await.as_deref().map(str::trim),
            Some("y") | Some("Y") | Some("yes")
        )
    }

    async fn prompt(&self, message: &str, default: &str) -> Option<String> {
        print!("📝 {} [{}]: ", message, default);
        let _ = io::stdout().flush();
        let answer = Self::read_line().await?;
        if answer.trim().is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }
}
