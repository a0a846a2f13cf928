//! Seams between the conversation session and whatever displays it.

use async_trait::async_trait;

use crate::events::{ConversationEntry, ConversationSummary};

/// The page the chat is rendered on.
///
/// A home page has a composition input and a history list but no transcript
/// view; a chat page has all three.
pub trait ChatSurface: Send {
    fn has_transcript_view(&self) -> bool;

    /// Current text of the composition input
    fn read_input(&self) -> String;

    fn set_input(&mut self, text: &str);

    fn clear_input(&mut self);

    /// Remove every message node from the transcript view
    fn clear_transcript(&mut self);

    /// Append a message node; `markup` is the rendered form of `entry`
    fn append_message(&mut self, entry: &ConversationEntry, markup: &str);

    /// Show or hide the pending-reply indicator
    fn set_typing(&mut self, typing: bool);

    fn scroll_to_bottom(&mut self);

    fn render_history(&mut self, entries: &[ConversationSummary]);
}

/// Blocking-style dialogs, resolved when the user confirms or cancels
#[async_trait]
pub trait Dialogs: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;

    /// `None` when the prompt is cancelled
    async fn prompt(&self, message: &str, default: &str) -> Option<String>;
}
