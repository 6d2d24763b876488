//! genai CLI configuration loader.
//!
//! TOML file first, then environment overrides, then validation.

use genai_core::{GenAiConfig, Provider};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub genai: GenAiConfig,
}

impl AppConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok()).await
    }

    async fn load_with_env<F>(path: Option<PathBuf>, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match path {
            Some(path) => Self::read(&path).await?,
            None => {
                let path = default_config_path();
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    Self::read(&path).await?
                } else {
                    tracing::debug!(path = %path.display(), "no config file; using defaults");
                    Self::default()
                }
            }
        };

        cfg.apply_env_overrides(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    async fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))
    }

    fn apply_env_overrides<F>(&mut self, env: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("GENAI_PROVIDER") {
            self.genai.provider = v.parse::<Provider>()?;
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.genai.openai_api_key = Some(v);
        }
        if let Some(v) = var("CLAUDE_API_KEY").or_else(|| var("ANTHROPIC_API_KEY")) {
            self.genai.claude_api_key = Some(v);
        }
        if let Some(v) = var("GENAI_REQUEST_TIMEOUT_SECS") {
            self.genai.request_timeout_secs = v.trim().parse().map_err(|e| {
                anyhow::anyhow!("GENAI_REQUEST_TIMEOUT_SECS={v:?} is not a number: {e}")
            })?;
        }
        if let Some(v) = var("OPENAI_BASE_URL") {
            self.genai.openai_base_url = v;
        }
        if let Some(v) = var("CLAUDE_BASE_URL") {
            self.genai.claude_base_url = v;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.genai.validate()?;
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".genai").join("config.toml")
}
