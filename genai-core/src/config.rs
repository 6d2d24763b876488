use crate::error::{LlmError, Result};
use crate::types::Provider;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CLAUDE_BASE_URL: &str = "https://api.anthropic.com";

/// Explicit client configuration. Each `GenAiClient` owns its own copy.
#[derive(Clone, Deserialize)]
pub struct GenAiConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub claude_api_key: Option<String>,
    /// Total per-request timeout applied to the shared HTTP session.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_claude_base_url")]
    pub claude_base_url: String,
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_claude_base_url() -> String {
    DEFAULT_CLAUDE_BASE_URL.to_string()
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            openai_api_key: None,
            claude_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            openai_base_url: default_openai_base_url(),
            claude_base_url: default_claude_base_url(),
        }
    }
}

impl fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("provider", &self.provider)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("claude_api_key", &redact(&self.claude_api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("openai_base_url", &self.openai_base_url)
            .field("claude_base_url", &self.claude_base_url)
            .finish()
    }
}

fn redact(key: &Option<String>) -> Option<&'static str> {
    key.as_ref().map(|_| "<redacted>")
}

impl GenAiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Non-empty credential for `provider`, if any.
    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Claude => self.claude_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn base_url_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAI => &self.openai_base_url,
            Provider::Claude => &self.claude_base_url,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(LlmError::InvalidConfig(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        for (name, url) in [
            ("openai_base_url", &self.openai_base_url),
            ("claude_base_url", &self.claude_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(LlmError::InvalidConfig(format!(
                    "{name} must start with http:// or https://, got {url:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_do_not_count_as_configured() {
        let cfg = GenAiConfig {
            openai_api_key: Some("   ".to_string()),
            claude_api_key: Some(" sk-ant ".to_string()),
            ..GenAiConfig::default()
        };
        assert_eq!(cfg.api_key_for(Provider::OpenAI), None);
        assert_eq!(cfg.api_key_for(Provider::Claude), Some("sk-ant"));
    }

    #[test]
    fn debug_output_hides_keys() {
        let cfg = GenAiConfig {
            openai_api_key: Some("sk-secret".to_string()),
            ..GenAiConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn defaults_target_public_endpoints() {
        let cfg = GenAiConfig::default();
        assert_eq!(cfg.provider, Provider::OpenAI);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.base_url_for(Provider::Claude), DEFAULT_CLAUDE_BASE_URL);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn validate_rejects_zero_timeout_and_bad_urls() {
        let zero = GenAiConfig {
            request_timeout_secs: 0,
            ..GenAiConfig::default()
        };
        assert!(zero.validate().expect_err("zero timeout").is_configuration());

        let bad_url = GenAiConfig {
            openai_base_url: "ftp://api.example.com".to_string(),
            ..GenAiConfig::default()
        };
        assert!(bad_url.validate().is_err());
    }
}
