use crate::error::{LlmError, Result};
use crate::types::{GenerationResponse, Provider};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// One provider's request/response translation.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    async fn handle(
        &self,
        prompt: &str,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerationResponse>;
}

/// Shared POST + status check + decode used by every adapter.
pub(crate) async fn post_json<B, R>(
    request: reqwest::RequestBuilder,
    provider: Provider,
    body: &B,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request.json(body).send().await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(LlmError::Http(format!(
            "{provider} status={status} body={text}"
        )));
    }

    serde_json::from_str(&text)
        .map_err(|e| LlmError::ResponseFormat(format!("{provider} json error={e} body={text}")))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
