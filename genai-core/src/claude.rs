use crate::adapter::{ProviderAdapter, endpoint, post_json};
use crate::error::Result;
use crate::json::to_spaced_json;
use crate::types::{GenerationResponse, Provider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CLAUDE_MESSAGES_PATH: &str = "/v1/messages";
const CLAUDE_VERSION: &str = "2023-06-01";
const CLAUDE_MODEL: &str = "claude-3-sonnet-20240229";
const CLAUDE_MAX_TOKENS: u32 = 1500;
const JSON_OUTPUT_TOOL: &str = "json_output";
const JSON_OUTPUT_TOOL_DESCRIPTION: &str = "A tool to output a JSON object matching a schema.";

#[derive(Clone)]
pub struct ClaudeAdapter {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl ClaudeAdapter {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            url: endpoint(base_url, CLAUDE_MESSAGES_PATH),
        }
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = "claude", schema = schema.is_some()))]
    async fn handle(
        &self,
        prompt: &str,
        schema: Option<&serde_json::Value>,
    ) -> Result<GenerationResponse> {
        let req = ClaudeRequest::new(prompt, schema);
        let parsed: ClaudeResponse = post_json(
            self.http
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", CLAUDE_VERSION),
            Provider::Claude,
            &req,
        )
        .await?;
        parsed.into_generation(schema.is_some())
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'static str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ClaudeTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ClaudeToolChoice>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ClaudeTool<'a> {
    name: &'static str,
    description: &'static str,
    input_schema: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ClaudeToolChoice {
    r#type: &'static str,
    name: &'static str,
}

impl<'a> ClaudeRequest<'a> {
    fn new(prompt: &'a str, schema: Option<&'a serde_json::Value>) -> Self {
        let (tools, tool_choice) = match schema {
            Some(input_schema) => (
                vec![ClaudeTool {
                    name: JSON_OUTPUT_TOOL,
                    description: JSON_OUTPUT_TOOL_DESCRIPTION,
                    input_schema,
                }],
                Some(ClaudeToolChoice {
                    r#type: "tool",
                    name: JSON_OUTPUT_TOOL,
                }),
            ),
            None => (Vec::new(), None),
        };

        Self {
            model: CLAUDE_MODEL,
            max_tokens: CLAUDE_MAX_TOKENS,
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
            tools,
            tool_choice,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default, deserialize_with = "lenient_blocks")]
    content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default = "empty_object")]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// Blocks that don't decode (e.g. no `type` key) are kept as `Other` and skipped.
fn lenient_blocks<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<ClaudeContentBlock>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|block| serde_json::from_value(block).unwrap_or(ClaudeContentBlock::Other))
        .collect())
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Default, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl ClaudeResponse {
    /// A missing tool_use/text block yields empty content, not an error.
    fn into_generation(self, structured: bool) -> Result<GenerationResponse> {
        let content = if structured {
            let input = self.content.into_iter().find_map(|block| match block {
                ClaudeContentBlock::ToolUse { input } => Some(input),
                _ => None,
            });
            match input {
                Some(input) => to_spaced_json(&input)?,
                None => {
                    tracing::warn!(
                        provider = "claude",
                        "no tool_use block in structured response"
                    );
                    String::new()
                }
            }
        } else {
            self.content
                .into_iter()
                .find_map(|block| match block {
                    ClaudeContentBlock::Text { text } => Some(text),
                    _ => None,
                })
                .unwrap_or_default()
        };

        let tokens_used = self
            .usage
            .input_tokens
            .saturating_add(self.usage.output_tokens);
        tracing::info!(provider = "claude", tokens_used, "completion received");

        Ok(GenerationResponse {
            content,
            provider: Provider::Claude,
            tokens_used,
        })
    }
}
