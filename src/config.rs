use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding persisted conversations
    pub data_dir: PathBuf,

    /// Default tracing filter, `RUST_LOG` takes precedence
    pub log_filter: String,

    /// Simulated assistant configuration
    pub reply: ReplyConfig,

    /// UI preferences
    pub ui: UiConfig,
}

/// Simulated reply configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Lower bound of the reply delay, inclusive
    pub min_delay_ms: u64,
    /// Upper bound of the reply delay, exclusive
    pub max_delay_ms: u64,
    /// Canned replies, the built-in set is used when empty
    pub canned: Vec<String>,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Characters of the first user message used as a default title
    pub title_max_chars: usize,
    /// Title of a conversation with no user message yet
    pub default_title: String,
    /// Pause before replaying a stashed message on the chat page
    pub resume_delay_ms: u64,
    /// Suggestion shortcuts offered on the home page
    pub suggestions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            data_dir: home.join(".triqai"),
            log_filter: "warn".to_string(),
            reply: ReplyConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        ReplyConfig {
            min_delay_ms: 1500,
            max_delay_ms: 2500,
            canned: Vec::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            title_max_chars: 30,
            default_title: "New conversation".to_string(),
            resume_delay_ms: 500,
            suggestions: vec![
                "Create a Spigot plugin that adds custom crafting recipes".to_string(),
                "Design a medieval castle I can build in survival".to_string(),
                "Explain how redstone comparators work".to_string(),
                "Translate my server rules into Spanish".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from `~/.triqai/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_from(&home.join(".triqai").join("config.toml"))
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `config.toml` inside the data directory
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .context("Failed to create data directory")?;

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(self.config_path(), content)
            .context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    /// File backing the persistent conversation store
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}
