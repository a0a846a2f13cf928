use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Prefix shared by every stored conversation key
pub const CONVERSATION_KEY_PREFIX: &str = "chat_";

/// Identifier of a stored conversation, `chat_<unix-millis>`.
///
/// The id doubles as the storage key of the conversation transcript. Ordering
/// follows the embedded creation timestamp, so newer conversations sort after
/// older ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId {
    raw: String,
    millis: i64,
}

impl ConversationId {
    /// Build an id from a creation timestamp in milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self {
            raw: format!("{}{}", CONVERSATION_KEY_PREFIX, millis),
            millis,
        }
    }

    /// Recognize a storage key as a conversation id
    pub fn parse(key: &str) -> Option<Self> {
        let suffix = key.strip_prefix(CONVERSATION_KEY_PREFIX)?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let millis = suffix.parse::<i64>().ok()?;
        Some(Self {
            raw: key.to_string(),
            millis,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Creation time embedded in the id
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}

impl Ord for ConversationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis
            .cmp(&other.millis)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ConversationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a conversation id: {}", value))
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.raw
    }
}

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "You",
            ConversationRole::Assistant => "TriqAI",
        }
    }
}

/// Individual conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One row of the history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub relative_time: String,
}

/// Pages the chat can be shown on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Blank composition page, no transcript view
    Home,
    /// Conversation page with a transcript view
    Chat,
}

/// Follow-up requested by a session operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    None,
    Navigate(Route),
}
