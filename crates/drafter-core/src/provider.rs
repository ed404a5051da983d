use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::ai::{ClaudeClient, OllamaClient, OpenAIClient};
use crate::compose::{self, IMPROVE_SYSTEM_PROMPT, SYSTEM_PROMPT};
use crate::config::Config;
use crate::content_script::EmailGenerator;
use crate::guidance;
use crate::profile::ProfileInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    Claude,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Claude => "claude",
            Provider::OpenAI => "openai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Provider::Ollama),
            "claude" => Some(Provider::Claude),
            "openai" | "lmstudio" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama (Local)",
            Provider::Claude => "Claude (Anthropic)",
            Provider::OpenAI => "OpenAI-compatible",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.2:latest",
            Provider::Claude => "claude-3-5-haiku-20241022",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }
}

#[derive(Clone)]
enum Backend {
    Ollama(OllamaClient),
    Claude(ClaudeClient),
    OpenAI(OpenAIClient),
}

/// Drafts emails with whichever model the config selects.
#[derive(Clone)]
pub struct ModelGenerator {
    backend: Backend,
    provider: Provider,
    model: String,
    system_prompt: String,
}

impl ModelGenerator {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = config.provider();
        let backend = match provider {
            Provider::Ollama => Backend::Ollama(OllamaClient::new(config.ollama_url())),
            Provider::Claude => {
                let key = config
                    .claude_api_key()
                    .ok_or_else(|| anyhow!("Claude API key not configured. Set ANTHROPIC_API_KEY."))?;
                Backend::Claude(ClaudeClient::new(&key))
            }
            Provider::OpenAI => {
                let key = config.openai_api_key();
                Backend::OpenAI(OpenAIClient::with_base_url(
                    config.openai_base_url(),
                    key.as_deref(),
                ))
            }
        };

        let guidance = match config.guidance_path() {
            Some(path) => {
                let text = guidance::load(path).with_context(|| {
                    format!("Failed to load guidance from: {}", path.display())
                })?;
                info!(path = %path.display(), chars = text.len(), "loaded drafting guidance");
                Some(text)
            }
            None => None,
        };

        Ok(Self {
            backend,
            provider,
            model: config.model(),
            system_prompt: compose::with_guidance(SYSTEM_PROMPT, guidance.as_deref()),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// System prompt for new drafts, including any configured guidance.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    async fn chat(&self, system: &str, prompt: &str) -> Result<String> {
        match &self.backend {
            Backend::Ollama(client) => client.chat(&self.model, system, prompt).await,
            Backend::Claude(client) => client.chat(&self.model, system, prompt).await,
            Backend::OpenAI(client) => client.chat(&self.model, system, prompt).await,
        }
    }

    async fn compose(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(provider = self.provider.as_str(), model = %self.model, "querying model");
        let raw = self.chat(system, prompt).await?;
        let composed = compose::parse_model_output(&raw)?;
        for reason in &composed.rationale {
            debug!(%reason, "draft rationale");
        }
        Ok(composed.body)
    }
}

#[async_trait]
impl EmailGenerator for ModelGenerator {
    async fn generate(&self, profile: &ProfileInfo, context: &str) -> Result<String> {
        let prompt = compose::build_user_prompt(profile, context);
        self.compose(&self.system_prompt, &prompt).await
    }

    async fn improve(
        &self,
        profile: &ProfileInfo,
        draft: &str,
        instructions: &str,
    ) -> Result<String> {
        let prompt = compose::build_improve_prompt(profile, draft, instructions);
        self.compose(IMPROVE_SYSTEM_PROMPT, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_round_trip() {
        for provider in [Provider::Ollama, Provider::Claude, Provider::OpenAI] {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str("LMStudio"), Some(Provider::OpenAI));
        assert_eq!(Provider::from_str("gemini"), None);
    }

    #[test]
    fn test_generator_uses_config_model() {
        let config = Config {
            provider: Some("ollama".into()),
            default_model: Some("gemma3:latest".into()),
            ..Config::new()
        };
        let generator = ModelGenerator::from_config(&config).unwrap();
        assert_eq!(generator.provider(), Provider::Ollama);
        assert_eq!(generator.model(), "gemma3:latest");
        assert_eq!(generator.system_prompt(), SYSTEM_PROMPT);
    }

    #[test]
    fn test_guidance_extends_system_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.txt");
        std::fs::write(&path, "Always mention the pilot program.").unwrap();

        let config = Config {
            guidance_path: Some(path.to_string_lossy().into_owned()),
            ..Config::new()
        };
        let generator = ModelGenerator::from_config(&config).unwrap();
        assert!(generator.system_prompt().starts_with(SYSTEM_PROMPT));
        assert!(generator
            .system_prompt()
            .ends_with("--- Additional Guidance ---\nAlways mention the pilot program."));
    }

    #[test]
    fn test_missing_guidance_is_an_error() {
        let config = Config {
            guidance_path: Some("/nonexistent/drafter/guide.docx".into()),
            ..Config::new()
        };
        assert!(ModelGenerator::from_config(&config).is_err());
    }
}
