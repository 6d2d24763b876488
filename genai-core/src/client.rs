use crate::adapter::ProviderAdapter;
use crate::claude::ClaudeAdapter;
use crate::config::GenAiConfig;
use crate::error::{LlmError, Result};
use crate::openai::OpenAiAdapter;
use crate::session::SessionHolder;
use crate::types::{GenerationResponse, Provider};

/// Routes completion requests to the active provider's adapter.
///
/// Each instance owns its configuration and its HTTP session; there is no
/// shared global client. After [`close`](Self::close) the next request
/// transparently builds a new session.
#[derive(Debug)]
pub struct GenAiClient {
    config: GenAiConfig,
    session: SessionHolder,
}

impl GenAiClient {
    #[tracing::instrument(level = "debug", skip_all, fields(provider = %config.provider))]
    pub fn new(config: GenAiConfig) -> Self {
        let session = SessionHolder::new(config.request_timeout());
        Self { config, session }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.config.provider = provider;
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHolder {
        &self.session
    }

    /// Whether the active provider has a non-empty credential.
    pub fn is_configured(&self) -> bool {
        self.config.api_key_for(self.config.provider).is_some()
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = %self.config.provider, schema = schema.is_some()))]
    pub async fn generate_response(
        &self,
        prompt: &str,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerationResponse> {
        let provider = self.config.provider;
        let Some(api_key) = self.config.api_key_for(provider) else {
            tracing::warn!(%provider, "active provider has no api key");
            return Err(LlmError::NotConfigured { provider });
        };

        let http = self.session.acquire()?;
        let base_url = self.config.base_url_for(provider);
        let adapter: Box<dyn ProviderAdapter> = match provider {
            Provider::OpenAI => Box::new(OpenAiAdapter::new(http, api_key, base_url)),
            Provider::Claude => Box::new(ClaudeAdapter::new(http, api_key, base_url)),
        };
        adapter.handle(prompt, effective_schema(schema)).await
    }

    /// Releases the HTTP session. Safe to call repeatedly.
    pub fn close(&self) {
        self.session.release();
    }
}

/// Null and empty schemas mean "no schema": plain request, text parsing.
fn effective_schema(schema: Option<&serde_json::Value>) -> Option<&serde_json::Value> {
    schema.filter(|s| match s {
        serde_json::Value::Null => false,
        serde_json::Value::Object(m) => !m.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        _ => true,
    })
}
