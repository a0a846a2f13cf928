//! Conversation core of the TriqAI chat widget.
//!
//! A [`session::ConversationSession`] drives one tab: it appends user turns,
//! asks a [`llm::ReplyProvider`] for the assistant turn and persists both
//! through a [`history::ConversationStore`]. Presentation happens behind the
//! [`ui::ChatSurface`] and [`ui::Dialogs`] traits.

pub mod commands;
pub mod config;
pub mod events;
pub mod history;
pub mod llm;
pub mod logging;
pub mod render;
pub mod session;
pub mod storage;
pub mod ui;
