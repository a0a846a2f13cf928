//! Markup for chat messages.
//!
//! User text is always escaped. Assistant text is escaped too and then gets a
//! small markdown-like pass: `**bold**`, `*italic*`, bullets and line breaks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::events::{ConversationEntry, ConversationRole};

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"));

/// Neutralize every markup-significant character
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_user(text: &str) -> String {
    escape(text)
}

pub fn render_assistant(text: &str) -> String {
    let escaped = escape(text);
    let bold = BOLD.replace_all(&escaped, "<strong>${1}</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>${1}</em>");
    italic.replace('•', "&bull;").replace('\n', "<br>")
}

/// Inner markup of a message according to its role
pub fn render_text(entry: &ConversationEntry) -> String {
    match entry.role {
        ConversationRole::User => render_user(&entry.content),
        ConversationRole::Assistant => render_assistant(&entry.content),
    }
}

/// Full message node for the transcript list
pub fn render_entry(entry: &ConversationEntry, index: usize) -> String {
    match entry.role {
        ConversationRole::User => format!(
            concat!(
                r#"<div class="message user-message" data-index="{index}">"#,
                r#"<div class="message-content">"#,
                r#"<div class="avatar user-avatar"><i class="fas fa-user"></i></div>"#,
                r#"<div class="text">{text}</div>"#,
                r#"</div></div>"#,
            ),
            index = index,
            text = render_user(&entry.content),
        ),
        ConversationRole::Assistant => format!(
            concat!(
                r#"<div class="message ai-message" data-index="{index}">"#,
                r#"<div class="message-content">"#,
                r#"<div class="avatar ai-avatar"><i class="fas fa-robot"></i></div>"#,
                r#"<div class="text">{text}</div>"#,
                r#"<div class="message-actions">"#,
                r#"<button class="action-btn" data-action="copy" data-index="{index}" title="Copy"><i class="fas fa-copy"></i></button>"#,
                r#"<button class="action-btn" data-action="like" data-index="{index}" title="Like"><i class="fas fa-thumbs-up"></i></button>"#,
                r#"<button class="action-btn" data-action="dislike" data-index="{index}" title="Dislike"><i class="fas fa-thumbs-down"></i></button>"#,
                r#"</div></div></div>"#,
            ),
            index = index,
            text = render_assistant(&entry.content),
        ),
    }
}

pub fn render_transcript(entries: &[ConversationEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| render_entry(entry, index))
        .collect()
}

/// Placeholder node shown while a reply is pending
pub fn typing_indicator() -> &'static str {
    concat!(
        r#"<div class="message ai-message typing-indicator">"#,
        r#"<div class="message-content">"#,
        r#"<div class="avatar ai-avatar"><i class="fas fa-robot"></i></div>"#,
        r#"<div class="text"><div class="typing-animation"><span></span><span></span><span></span></div></div>"#,
        r#"</div></div>"#,
    )
}
