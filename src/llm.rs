use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::time::Duration;
use tracing::debug;

use crate::config::ReplyConfig;

/// Source of assistant replies.
///
/// The chat only ever asks for one reply per user message; implementations
/// must tolerate concurrent calls.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    async fn reply(&self, user_text: &str) -> Result<String>;
}

const DEFAULT_REPLIES: [&str; 3] = [
    "Hi! 👋 I'm TriqAI, your Minecraft assistant. I'm currently in **BETA**, so my abilities are still being polished.\n\n🚧 **Coming soon:**\n• Advanced plugin programming\n• .schem structure generation\n• Optimized code review\n• And many more features\n\nThanks for your patience while I improve! 🚀",
    "Thanks for trying TriqAI! 🤖\n\nI'm in the **BETA** phase and my developers are working hard on some great features:\n\n✨ **In development:**\n• Smart replies\n• Automatic plugin creation\n• Building assistance\n• Advanced translation\n\nI'll be fully operational soon! 💜",
    "Hi! I'm TriqAI Beta 🎮\n\nI specialize in **Minecraft** but I'm still learning. My creators ship new features every day.\n\n🔜 **Upcoming updates:**\n• Contextual answers\n• Spigot/Paper code generation\n• Building tips\n• And much more...\n\nStay tuned for updates! ⚡",
];

/// Stand-in assistant: waits a random delay, then answers with a canned
/// message. The user text is ignored.
#[derive(Debug, Clone)]
pub struct CannedReplyProvider {
    replies: Vec<String>,
    min_delay: Duration,
    max_delay: Duration,
}

impl CannedReplyProvider {
    pub fn new(config: &ReplyConfig) -> Self {
        let replies = if config.canned.is_empty() {
            DEFAULT_REPLIES.iter().map(|s| s.to_string()).collect()
        } else {
            config.canned.clone()
        };

        Self {
            replies,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    fn pick_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..self.max_delay)
    }

    fn pick_reply(&self) -> String {
        self.replies
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for CannedReplyProvider {
    fn default() -> Self {
        Self::new(&ReplyConfig::default())
    }
}

#[async_trait]
impl ReplyProvider for CannedReplyProvider {
    async fn reply(&self, _user_text: &str) -> Result<String> {
        let delay = self.pick_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Simulating assistant reply");
        tokio::time::sleep(delay).await;
        Ok(self.pick_reply())
    }
}
