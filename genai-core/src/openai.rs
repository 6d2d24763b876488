use crate::adapter::{ProviderAdapter, endpoint, post_json};
use crate::error::{LlmError, Result};
use crate::json::to_spaced_json;
use crate::types::{GenerationResponse, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const OPENAI_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4";
const OPENAI_MAX_TOKENS: u32 = 1500;
const OPENAI_TEMPERATURE: f64 = 0.7;
const SCHEMA_INSTRUCTION: &str = "\n\nPlease respond in valid JSON format matching this schema: ";

#[derive(Clone)]
pub struct OpenAiAdapter {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl OpenAiAdapter {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            url: endpoint(base_url, OPENAI_CHAT_COMPLETIONS_PATH),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = "openai", schema = schema.is_some()))]
    async fn handle(
        &self,
        prompt: &str,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerationResponse> {
        let req = OpenAiChatRequest::new(prompt, schema)?;
        let parsed: OpenAiChatResponse = post_json(
            self.http.post(&self.url).bearer_auth(&self.api_key),
            Provider::OpenAI,
            &req,
        )
        .await?;
        parsed.try_into()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: &'static str,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    r#type: &'static str,
}

impl OpenAiChatRequest {
    fn new(prompt: &str, schema: Option<&serde_json::Value>) -> Result<Self> {
        // json_object mode alone does not enforce field names, so the schema
        // also rides along in the prompt text.
        let (content, response_format) = match schema {
            Some(schema) => (
                format!("{prompt}{SCHEMA_INSTRUCTION}{}", to_spaced_json(schema)?),
                Some(OpenAiResponseFormat {
                    r#type: "json_object",
                }),
            ),
            None => (prompt.to_string(), None),
        };

        Ok(Self {
            model: OPENAI_MODEL,
            messages: vec![OpenAiMessage {
                role: "user",
                content,
            }],
            max_tokens: OPENAI_MAX_TOKENS,
            temperature: OPENAI_TEMPERATURE,
            response_format,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    total_tokens: u64,
}

impl TryFrom<OpenAiChatResponse> for GenerationResponse {
    type Error = LlmError;

    fn try_from(v: OpenAiChatResponse) -> Result<Self> {
        let Some(choice) = v.choices.into_iter().next() else {
            return Err(LlmError::ResponseFormat(
                "openai response has no choices".to_string(),
            ));
        };
        let Some(content) = choice.message.content else {
            return Err(LlmError::ResponseFormat(
                "openai choices[0].message.content missing".to_string(),
            ));
        };
        let tokens_used = v.usage.map(|u| u.total_tokens).unwrap_or(0);
        tracing::info!(provider = "openai", tokens_used, "completion received");

        Ok(GenerationResponse {
            content,
            provider: Provider::OpenAI,
            tokens_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OpenAiAdapter {
        OpenAiAdapter::new(reqwest::Client::new(), "sk-test", &server.uri())
    }

    async fn sent_body(server: &MockServer) -> serde_json::Value {
        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        requests[0].body_json().expect("json body")
    }

    #[test]
    fn plain_request_has_no_response_format() {
        let req = OpenAiChatRequest::new("hello", None).expect("build");
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(v["model"], "gpt-4");
        assert_eq!(v["max_tokens"], 1500);
        assert_eq!(v["temperature"], 0.7);
        assert_eq!(v["messages"], json!([{"role": "user", "content": "hello"}]));
        assert!(v.get("response_format").is_none());
    }

    #[test]
    fn schema_request_sets_flag_and_embeds_schema_text() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "integer"}}});
        let req = OpenAiChatRequest::new("Rate it.", Some(&schema)).expect("build");
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(v["response_format"], json!({"type": "json_object"}));
        let content = v["messages"][0]["content"].as_str().expect("content");
        assert!(content.starts_with("Rate it.\n\nPlease respond in valid JSON format"));
        assert!(content.ends_with(
            r#"{"type": "object", "properties": {"a": {"type": "integer"}}}"#
        ));
    }

    #[tokio::test]
    async fn handle_posts_once_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}],
                "usage": {"prompt_tokens": 7, "completion_tokens": 70, "total_tokens": 77}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let openai = adapter(&server);
        assert_eq!(openai.provider(), Provider::OpenAI);
        let resp = openai.handle("hello", None).await.expect("ok");
        assert_eq!(resp.content, "hi there");
        assert_eq!(resp.provider, Provider::OpenAI);
        assert_eq!(resp.tokens_used, 77);

        let body = sent_body(&server).await;
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn handle_with_schema_sends_schema_in_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"a\": 1}"}}]
            })))
            .mount(&server)
            .await;

        let schema = json!({"a": "integer"});
        let resp = adapter(&server)
            .handle("Give me a.", Some(&schema))
            .await
            .expect("ok");
        assert_eq!(resp.tokens_used, 0);
        assert_eq!(
            resp.parse_content::<serde_json::Value>().expect("json"),
            json!({"a": 1})
        );

        let body = sent_body(&server).await;
        assert_eq!(body["response_format"]["type"], "json_object");
        let content = body["messages"][0]["content"].as_str().expect("content");
        assert!(content.contains(r#"{"a": "integer"}"#));
    }

    #[tokio::test]
    async fn missing_choices_is_a_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .mount(&server)
            .await;

        let err = adapter(&server).handle("hello", None).await.expect_err("malformed");
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = adapter(&server).handle("hello", None).await.expect_err("401");
        match err {
            LlmError::Http(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("bad key"));
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }
}
