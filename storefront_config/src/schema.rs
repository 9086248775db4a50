use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use storefront_conversation::{ChatConfig, DEFAULT_APOLOGY, HistoryConfig};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    #[serde(default = "AssistantConfig::default_endpoint")]
    pub endpoint: String,
    /// Per-attempt HTTP timeout
    #[serde(default = "AssistantConfig::default_timeout_secs")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timeout_secs: Self::default_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl AssistantConfig {
    fn default_endpoint() -> String {
        "http://localhost:8000/chat".to_string()
    }

    const fn default_timeout_secs() -> Option<u64> {
        Some(30)
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default)]
    pub base_delays_ms: Vec<u64>,
    #[serde(default)]
    pub final_retries: usize,
    #[serde(default)]
    pub final_delay_ms: u64,
}

impl RetryConfig {
    #[must_use]
    pub fn base_delays(&self) -> Vec<Duration> {
        self.base_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }

    #[must_use]
    pub const fn final_delay(&self) -> Duration {
        Duration::from_millis(self.final_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "ChatSettings::default_apology")]
    pub apology: String,
    /// Overall limit for one exchange, retries included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            apology: Self::default_apology(),
            request_timeout_secs: None,
        }
    }
}

impl ChatSettings {
    fn default_apology() -> String {
        DEFAULT_APOLOGY.to_string()
    }

    #[must_use]
    pub fn to_chat_config(&self) -> ChatConfig {
        let config = ChatConfig::default()
            .with_history(self.history.clone())
            .with_apology(self.apology.clone());

        match self.request_timeout_secs {
            Some(secs) => config.with_request_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Origin of the storefront's product pages; blank accepts any origin
    #[serde(default = "CatalogConfig::default_product_base_url")]
    pub product_base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            product_base_url: Self::default_product_base_url(),
        }
    }
}

impl CatalogConfig {
    fn default_product_base_url() -> String {
        "http://localhost:3000".to_string()
    }
}

impl Config {
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("storefront"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'storefront init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    /// Like [`Config::load`], falling back to defaults when no file exists.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        Self::default().write_to(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set assistant.endpoint to your assistant backend");
        println!("   2. Set catalog.product_base_url to the storefront origin");
        println!("   3. Run 'storefront chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - chat.history.max_turns: Number of turns sent as context (default 5)");
        println!("   - chat.history.max_chars: Optional character cap on that context");
        println!("   - assistant.retry: Backoff delays for failed requests");
        println!();
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
