#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use triqai::config::UiConfig;
use triqai::events::{ConversationEntry, ConversationSummary, Route};
use triqai::history::ConversationStore;
use triqai::llm::ReplyProvider;
use triqai::session::ConversationSession;
use triqai::storage::MemoryStore;
use triqai::ui::{ChatSurface, Dialogs};

/// Everything a recording surface saw
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub input: String,
    pub messages: Vec<(ConversationEntry, String)>,
    pub typing: bool,
    pub history: Vec<ConversationSummary>,
    pub clears: usize,
    pub scrolls: usize,
}

#[derive(Clone)]
pub struct RecordingSurface {
    route: Route,
    pub log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            log: Arc::new(Mutex::new(SurfaceLog::default())),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, SurfaceLog> {
        self.log.lock().unwrap()
    }
}

impl ChatSurface for RecordingSurface {
    fn has_transcript_view(&self) -> bool {
        self.route == Route::Chat
    }

    fn read_input(&self) -> String {
        self.log().input.clone()
    }

    fn set_input(&mut self, text: &str) {
        self.log().input = text.to_string();
    }

    fn clear_input(&mut self) {
        self.log().input.clear();
    }

    fn clear_transcript(&mut self) {
        let mut log = self.log();
        log.messages.clear();
        log.clears += 1;
    }

    fn append_message(&mut self, entry: &ConversationEntry, markup: &str) {
        self.log()
            .messages
            .push((entry.clone(), markup.to_string()));
    }

    fn set_typing(&mut self, typing: bool) {
        self.log().typing = typing;
    }

    fn scroll_to_bottom(&mut self) {
        self.log().scrolls += 1;
    }

    fn render_history(&mut self, entries: &[ConversationSummary]) {
        self.log().history = entries.to_vec();
    }
}

/// Dialogs answering from a script, recording the questions asked
#[derive(Default)]
pub struct ScriptedDialogs {
    pub confirms: Mutex<VecDeque<bool>>,
    pub prompts: Mutex<VecDeque<Option<String>>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn confirming(answer: bool) -> Self {
        let dialogs = Self::default();
        dialogs.confirms.lock().unwrap().push_back(answer);
        dialogs
    }

    pub fn prompting(answer: Option<&str>) -> Self {
        let dialogs = Self::default();
        dialogs
            .prompts
            .lock()
            .unwrap()
            .push_back(answer.map(str::to_string));
        dialogs
    }
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(false)
    }

    async fn prompt(&self, message: &str, default: &str) -> Option<String> {
        self.asked.lock().unwrap().push(format!("{} [{}]", message, default));
        self.prompts.lock().unwrap().pop_front().flatten()
    }
}

/// Answers immediately with a fixed reply
pub struct InstantReplies(pub &'static str);

#[async_trait]
impl ReplyProvider for InstantReplies {
    async fn reply(&self, _user_text: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Holds every reply until `release` is called
#[derive(Default)]
pub struct GatedReplies {
    pub gate: Notify,
}

#[async_trait]
impl ReplyProvider for GatedReplies {
    async fn reply(&self, _user_text: &str) -> Result<String> {
        self.gate.notified().await;
        Ok("gated reply".to_string())
    }
}

pub struct Harness {
    pub persistent: Arc<MemoryStore>,
    pub transient: Arc<MemoryStore>,
    pub surface: RecordingSurface,
    pub session: ConversationSession,
}

pub fn ui_config() -> UiConfig {
    UiConfig {
        resume_delay_ms: 0,
        ..UiConfig::default()
    }
}

pub fn harness(route: Route, dialogs: Arc<dyn Dialogs>, replies: Arc<dyn ReplyProvider>) -> Harness {
    let persistent = Arc::new(MemoryStore::new());
    let transient = Arc::new(MemoryStore::new());
    let surface = RecordingSurface::new(route);
    let ui = ui_config();
    let store = ConversationStore::new(persistent.clone(), &ui);
    let session = ConversationSession::new(
        store,
        transient.clone(),
        Box::new(surface.clone()),
        dialogs,
        replies,
        &ui,
    );

    Harness {
        persistent,
        transient,
        surface,
        session,
    }
}

pub fn chat_harness() -> Harness {
    harness(
        Route::Chat,
        Arc::new(ScriptedDialogs::default()),
        Arc::new(InstantReplies("**Hi** there")),
    )
}
