//! Interactive chat commands

pub mod commands;

pub use commands::{ParsedCommand, SlashCommand, get_help_text, parse_slash_command};
