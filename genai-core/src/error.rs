use crate::types::Provider;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} not configured")]
    NotConfigured { provider: Provider },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl LlmError {
    /// True for failures detected before any network attempt.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured { .. } | Self::UnknownProvider(_) | Self::InvalidConfig(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}
