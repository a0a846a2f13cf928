use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::config::UiConfig;
use crate::events::{ConversationEntry, ConversationId, ConversationSummary, Route, SessionAction};
use crate::history::ConversationStore;
use crate::llm::ReplyProvider;
use crate::render::render_entry;
use crate::storage::{CURRENT_CHAT_KEY, KeyValueStore, PENDING_MESSAGE_KEY};
use crate::ui::{ChatSurface, Dialogs};

/// The conversation a browser tab is composing into.
///
/// Cheap to clone: every clone drives the same stores and surface, so event
/// handlers can each hold one. The active id and the stashed message live in
/// the session-scoped store, conversations in the persistent one.
#[derive(Clone)]
pub struct ConversationSession {
    store: ConversationStore,
    session: Arc<dyn KeyValueStore>,
    surface: Arc<Mutex<Box<dyn ChatSurface>>>,
    dialogs: Arc<dyn Dialogs>,
    replies: Arc<dyn ReplyProvider>,
    resume_delay: Duration,
}

impl ConversationSession {
    pub fn new(
        store: ConversationStore,
        session: Arc<dyn KeyValueStore>,
        surface: Box<dyn ChatSurface>,
        dialogs: Arc<dyn Dialogs>,
        replies: Arc<dyn ReplyProvider>,
        ui: &UiConfig,
    ) -> Self {
        Self {
            store,
            session,
            surface: Arc::new(Mutex::new(surface)),
            dialogs,
            replies,
            resume_delay: Duration::from_millis(ui.resume_delay_ms),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Active conversation, if one has been started in this session
    pub fn active_id(&self) -> Option<ConversationId> {
        self.session
            .get(CURRENT_CHAT_KEY)
            .and_then(|raw| ConversationId::parse(&raw))
    }

    /// Active conversation, minting and remembering a new id if needed
    pub fn get_or_create_active_id(&self) -> Result<ConversationId> {
        if let Some(id) = self.active_id() {
            return Ok(id);
        }

        let id = self.store.next_id(Utc::now());
        self.session
            .set(CURRENT_CHAT_KEY, id.as_str())
            .context("Failed to remember active conversation")?;
        info!(conversation = %id, "Started conversation");
        Ok(id)
    }

    /// Replace the page the session renders to
    pub fn attach_surface(&self, surface: Box<dyn ChatSurface>) {
        *self.lock_surface() = surface;
        self.refresh_history();
    }

    /// Attach a chat page: redisplay the active conversation and replay any
    /// stashed message
    pub async fn enter_chat_view(&self, surface: Box<dyn ChatSurface>) -> Result<SessionAction> {
        self.attach_surface(surface);
        if let Some(id) = self.active_id() {
            self.display_conversation(&id);
        }
        self.resume_pending().await
    }

    /// Send whatever is in the composition input
    pub async fn submit(&self) -> Result<SessionAction> {
        let text = self.with_surface(|surface| surface.read_input());
        self.send(&text).await
    }

    /// Fill the composition input with a suggestion shortcut
    pub fn apply_suggestion(&self, text: &str) {
        self.with_surface(|surface| surface.set_input(text));
    }

    /// Append a user turn, wait for the reply and append the assistant turn.
    ///
    /// Without a transcript view the text is stashed instead and the caller is
    /// asked to navigate to the chat page.
    pub async fn send(&self, text: &str) -> Result<SessionAction> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SessionAction::None);
        }

        if !self.with_surface(|surface| surface.has_transcript_view()) {
            self.session
                .set(PENDING_MESSAGE_KEY, text)
                .context("Failed to stash message")?;
            debug!("Stashed message until the chat page is shown");
            return Ok(SessionAction::Navigate(Route::Chat));
        }

        let id = self.get_or_create_active_id()?;
        let user = ConversationEntry::user(text);
        let index = self.store.append_entry(&id, user.clone())?;
        self.with_surface(|surface| {
            surface.clear_input();
            surface.append_message(&user, &render_entry(&user, index));
            surface.set_typing(true);
            surface.scroll_to_bottom();
        });
        self.refresh_history();

        let reply = match self.replies.reply(text).await {
            Ok(reply) => reply,
            Err(e) => {
                self.with_surface(|surface| surface.set_typing(false));
                return Err(e.context("Failed to get assistant reply"));
            }
        };

        // The reply belongs to the conversation it was asked in, even if the
        // user has moved on since, unless that conversation was deleted.
        let assistant = ConversationEntry::assistant(reply);
        let Some(index) = self.store.append_existing(&id, assistant.clone())? else {
            debug!(conversation = %id, "Dropping reply for deleted conversation");
            self.with_surface(|surface| surface.set_typing(false));
            return Ok(SessionAction::None);
        };
        let still_showing = self.active_id().as_ref() == Some(&id);
        self.with_surface(|surface| {
            surface.set_typing(false);
            if still_showing && surface.has_transcript_view() {
                surface.append_message(&assistant, &render_entry(&assistant, index));
                surface.scroll_to_bottom();
            }
        });
        self.refresh_history();

        Ok(SessionAction::None)
    }

    /// Replay a message stashed before navigating, at most once
    pub async fn resume_pending(&self) -> Result<SessionAction> {
        if !self.with_surface(|surface| surface.has_transcript_view()) {
            return Ok(SessionAction::None);
        }
        let Some(pending) = self.session.get(PENDING_MESSAGE_KEY) else {
            return Ok(SessionAction::None);
        };
        self.session
            .remove(PENDING_MESSAGE_KEY)
            .context("Failed to clear stashed message")?;

        debug!("Replaying stashed message");
        tokio::time::sleep(self.resume_delay).await;
        self.send(&pending).await
    }

    pub fn switch_to(&self, id: &ConversationId) -> Result<SessionAction> {
        self.session
            .set(CURRENT_CHAT_KEY, id.as_str())
            .context("Failed to remember active conversation")?;
        debug!(conversation = %id, "Switched conversation");

        if !self.with_surface(|surface| surface.has_transcript_view()) {
            return Ok(SessionAction::Navigate(Route::Chat));
        }
        self.display_conversation(id);
        self.refresh_history();
        Ok(SessionAction::None)
    }

    /// Forget the active conversation and any stashed message
    pub fn create_new(&self) -> Result<SessionAction> {
        self.session
            .remove(CURRENT_CHAT_KEY)
            .context("Failed to clear active conversation")?;
        self.session
            .remove(PENDING_MESSAGE_KEY)
            .context("Failed to clear stashed message")?;
        self.with_surface(|surface| {
            surface.clear_input();
            if surface.has_transcript_view() {
                surface.clear_transcript();
            }
        });
        Ok(SessionAction::Navigate(Route::Home))
    }

    /// Delete after confirmation; deleting the active conversation starts a new one
    pub async fn delete(&self, id: &ConversationId) -> Result<SessionAction> {
        if !self
            .dialogs
            .confirm("Delete this conversation? This cannot be undone.")
            .await
        {
            return Ok(SessionAction::None);
        }

        self.store.delete_conversation(id)?;
        self.refresh_history();

        if self.active_id().as_ref() == Some(id) {
            return self.create_new();
        }
        Ok(SessionAction::None)
    }

    /// Ask for a new title; returns whether one was stored
    pub async fn rename(&self, id: &ConversationId) -> Result<bool> {
        let current = self.store.get_title(id);
        let Some(title) = self.dialogs.prompt("New conversation title", &current).await else {
            return Ok(false);
        };
        self.rename_to(id, &title)
    }

    /// Store `title` as the custom title unless it is blank
    pub fn rename_to(&self, id: &ConversationId, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        self.store.set_title(id, title)?;
        self.refresh_history();
        Ok(true)
    }

    /// Plain text of a message in the active conversation
    pub fn copy_text(&self, index: usize) -> Option<String> {
        let id = self.active_id()?;
        self.store
            .get_transcript(&id)?
            .into_iter()
            .nth(index)
            .map(|entry| entry.content)
    }

    pub fn history(&self) -> Vec<ConversationSummary> {
        self.store.list_all()
    }

    pub fn refresh_history(&self) {
        let entries = self.store.list_all();
        self.with_surface(|surface| surface.render_history(&entries));
    }

    fn display_conversation(&self, id: &ConversationId) {
        let entries = self.store.get_transcript(id).unwrap_or_default();
        self.with_surface(|surface| {
            if !surface.has_transcript_view() {
                return;
            }
            surface.clear_transcript();
            for (index, entry) in entries.iter().enumerate() {
                surface.append_message(entry, &render_entry(entry, index));
            }
            surface.scroll_to_bottom();
        });
    }

    fn with_surface<R>(&self, f: impl FnOnce(&mut dyn ChatSurface) -> R) -> R {
        let mut surface = self.lock_surface();
        f(surface.as_mut())
    }

    fn lock_surface(&self) -> std::sync::MutexGuard<'_, Box<dyn ChatSurface>> {
        self.surface.lock().unwrap_or_else(|e| e.into_inner())
    }
}
