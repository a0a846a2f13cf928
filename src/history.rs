//! Persistent conversation history.
//!
//! Every conversation lives under its own key (`chat_<millis>`) as a JSON list
//! of entries. Custom titles share a single JSON map under `chatTitles`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::UiConfig;
use crate::events::{ConversationEntry, ConversationId, ConversationRole, ConversationSummary};
use crate::storage::{KeyValueStore, TITLES_KEY};

type TitleMap = BTreeMap<String, String>;

/// Conversation store over a key-value backend
#[derive(Clone)]
pub struct ConversationStore {
    kv: Arc<dyn KeyValueStore>,
    locks: Arc<Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>>,
    title_max_chars: usize,
    default_title: String,
}

impl ConversationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, ui: &UiConfig) -> Self {
        Self {
            kv,
            locks: Arc::new(Mutex::new(HashMap::new())),
            title_max_chars: ui.title_max_chars,
            default_title: ui.default_title.clone(),
        }
    }

    /// Every stored conversation, newest first
    pub fn list_all(&self) -> Vec<ConversationSummary> {
        self.list_all_at(Utc::now())
    }

    /// Same as [`list_all`](Self::list_all) with an explicit clock
    pub fn list_all_at(&self, now: DateTime<Utc>) -> Vec<ConversationSummary> {
        let titles = self.load_titles();
        let mut ids = self.ids();
        ids.sort_by(|a, b| b.cmp(a));

        ids.into_iter()
            .map(|id| {
                let title = self.resolve_title(&id, &titles);
                let relative_time = relative_time(&id, now);
                ConversationSummary {
                    id,
                    title,
                    relative_time,
                }
            })
            .collect()
    }

    /// Ids of every stored conversation, in storage order
    pub fn ids(&self) -> Vec<ConversationId> {
        self.kv
            .keys()
            .iter()
            .filter_map(|key| ConversationId::parse(key))
            .collect()
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.kv.get(id.as_str()).is_some()
    }

    /// Mint an id strictly newer than any stored conversation
    pub fn next_id(&self, now: DateTime<Utc>) -> ConversationId {
        let newest = self.ids().into_iter().map(|id| id.millis()).max();
        let millis = match newest {
            Some(newest) if newest >= now.timestamp_millis() => newest.saturating_add(1),
            _ => now.timestamp_millis(),
        };
        ConversationId::from_millis(millis)
    }

    /// Stored transcript, `None` when absent or unreadable
    pub fn get_transcript(&self, id: &ConversationId) -> Option<Vec<ConversationEntry>> {
        let raw = self.kv.get(id.as_str())?;
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(conversation = %id, error = %e, "Ignoring unreadable transcript");
                None
            }
        }
    }

    /// Overwrite the stored transcript
    pub fn save_transcript(&self, id: &ConversationId, entries: &[ConversationEntry]) -> Result<()> {
        let content = serde_json::to_string(entries)
            .context("Failed to serialize transcript")?;
        self.kv
            .set(id.as_str(), &content)
            .with_context(|| format!("Failed to save transcript {}", id))?;
        debug!(conversation = %id, entries = entries.len(), "Saved transcript");
        Ok(())
    }

    /// Append one entry, serialized against other appends to the same conversation
    pub fn append_entry(&self, id: &ConversationId, entry: ConversationEntry) -> Result<usize> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.get_transcript(id).unwrap_or_default();
        entries.push(entry);
        self.save_transcript(id, &entries)?;
        Ok(entries.len() - 1)
    }

    /// Append one entry only if the conversation still exists.
    ///
    /// Returns `None` when the transcript is gone, e.g. deleted while a reply
    /// was pending.
    pub fn append_existing(
        &self,
        id: &ConversationId,
        entry: ConversationEntry,
    ) -> Result<Option<usize>> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if !self.contains(id) {
            return Ok(None);
        }
        let mut entries = self.get_transcript(id).unwrap_or_default();
        entries.push(entry);
        self.save_transcript(id, &entries)?;
        Ok(Some(entries.len() - 1))
    }

    /// Custom title if set, else a snippet of the first user message
    pub fn get_title(&self, id: &ConversationId) -> String {
        self.resolve_title(id, &self.load_titles())
    }

    pub fn set_title(&self, id: &ConversationId, title: &str) -> Result<()> {
        let mut titles = self.load_titles();
        titles.insert(id.as_str().to_string(), title.to_string());
        self.save_titles(&titles)?;
        info!(conversation = %id, title, "Renamed conversation");
        Ok(())
    }

    /// Remove transcript and custom title together
    pub fn delete_conversation(&self, id: &ConversationId) -> Result<()> {
        let lock = self.lock_for(id);
        {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            self.kv
                .remove(id.as_str())
                .with_context(|| format!("Failed to remove transcript {}", id))?;

            let mut titles = self.load_titles();
            if titles.remove(id.as_str()).is_some() {
                self.save_titles(&titles)?;
            }
        }

        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        info!(conversation = %id, "Deleted conversation");
        Ok(())
    }

    fn lock_for(&self, id: &ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id.clone()).or_default().clone()
    }

    fn resolve_title(&self, id: &ConversationId, titles: &TitleMap) -> String {
        if let Some(title) = titles.get(id.as_str()) {
            return title.clone();
        }

        self.get_transcript(id)
            .and_then(|entries| {
                entries
                    .into_iter()
                    .find(|entry| entry.role == ConversationRole::User)
            })
            .map(|entry| snippet(&entry.content, self.title_max_chars))
            .unwrap_or_else(|| self.default_title.clone())
    }

    fn load_titles(&self) -> TitleMap {
        let Some(raw) = self.kv.get(TITLES_KEY) else {
            return TitleMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Custom titles are unreadable, ignoring them");
            TitleMap::new()
        })
    }

    fn save_titles(&self, titles: &TitleMap) -> Result<()> {
        let content = serde_json::to_string(titles)
            .context("Failed to serialize titles")?;
        self.kv
            .set(TITLES_KEY, &content)
            .context("Failed to save titles")?;
        Ok(())
    }
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Age of a conversation as `Xm`, `Xh` or `Xd`
pub fn relative_time(id: &ConversationId, now: DateTime<Utc>) -> String {
    let minutes = (now.timestamp_millis() - id.millis()).max(0) / 60_000;
    if minutes < 60 {
        format!("{}m", minutes)
    } else if minutes < 24 * 60 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / (24 * 60))
    }
}
