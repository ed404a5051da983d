use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::ai::openai::OPENAI_BASE_URL;
use crate::mailto::DEFAULT_SUBJECT;
use crate::orchestrator::COPY_FEEDBACK;
use crate::profile::ProfileInfo;
use crate::provider::Provider;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// A page to open as a tab at startup, with what its script knows about it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageConfig {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub profile: ProfileInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub ollama_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub mail_subject: Option<String>,
    pub copy_feedback_ms: Option<u64>,
    /// Document whose text is appended to the drafting system prompt.
    pub guidance_path: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some("ollama".to_string()),
            ..Default::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("drafter").join("config.json"))
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Ollama)
    }

    pub fn model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn openai_base_url(&self) -> &str {
        self.openai_base_url.as_deref().unwrap_or(OPENAI_BASE_URL)
    }

    /// Environment first, then the config file.
    pub fn claude_api_key(&self) -> Option<String> {
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .or_else(|| self.claude_api_key.clone())
    }

    pub fn openai_api_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .or_else(|| self.openai_api_key.clone())
    }

    pub fn mail_subject(&self) -> &str {
        self.mail_subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
    }

    pub fn guidance_path(&self) -> Option<&Path> {
        self.guidance_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(Path::new)
    }

    pub fn copy_feedback(&self) -> Duration {
        self.copy_feedback_ms
            .map(Duration::from_millis)
            .unwrap_or(COPY_FEEDBACK)
    }
}
