use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::events::ConversationId;

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a blank conversation
    New,
    /// List stored conversations
    List,
    /// Continue a stored conversation
    Switch,
    /// Give a conversation a custom title
    Rename,
    /// Delete a conversation
    Delete,
    /// Send one of the suggestion shortcuts
    Suggest,
    /// Print the plain text of a message
    Copy,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Conversation targeted by `/switch`, `/rename` or `/delete`
    pub fn conversation_target(&self) -> Option<ConversationId> {
        match self.command {
            SlashCommand::Switch | SlashCommand::Rename | SlashCommand::Delete => {}
            _ => return None,
        }

        let arg = self.argument()?.trim();
        ConversationId::parse(arg).or_else(|| {
            arg.parse::<i64>().ok().map(ConversationId::from_millis)
        })
    }

    /// One-based index argument of `/suggest` or `/copy`, as zero-based
    pub fn index_target(&self) -> Option<usize> {
        match self.command {
            SlashCommand::Suggest | SlashCommand::Copy => {}
            _ => return None,
        }

        let n = self.argument()?.trim().parse::<usize>().ok()?;
        n.checked_sub(1)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new conversation",
            SlashCommand::List => "list your conversations, newest first",
            SlashCommand::Switch => "continue a conversation (/switch <id>)",
            SlashCommand::Rename => "rename a conversation (/rename <id>)",
            SlashCommand::Delete => "delete a conversation (/delete <id>)",
            SlashCommand::Suggest => "send a suggestion from the welcome screen (/suggest <n>)",
            SlashCommand::Copy => "print the text of message <n> in this conversation",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter()
        .map(|c| (c.command(), c))
        .collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "n" => Some(SlashCommand::New),
        "ls" | "history" => Some(SlashCommand::List),
        "open" => Some(SlashCommand::Switch),
        "rm" => Some(SlashCommand::Delete),
        _ => None,
    })?;

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /bye, /n for /new, /ls for /list, /open for /switch, /rm for /delete");
    help.push_str("\nConversation ids may be given as chat_<millis> or just <millis>.");

    help
}
