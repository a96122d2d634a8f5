use crate::llm::AsyncLlmCaller;
use crate::tools::ToolSchema;
use crate::types::{LlmCompletion, Message, Role, ToolCall};
use async_trait::async_trait;

#[derive(serde::Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    tools: Vec<AnthropicToolDef>,
    messages: Vec<AnthropicMessage>,
}

#[derive(serde::Serialize)]
struct AnthropicToolDef {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(serde::Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(serde::Deserialize, Debug)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(serde::Deserialize, Debug)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: serde_json::Value },
}

/// Async Anthropic Messages API client, bound into the core via
/// `SyncWrapper`. Streaming is out of scope (no streaming UI).
pub struct AnthropicCaller {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl AnthropicCaller {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), api_key: api_key.into(), api_base: "https://api.anthropic.com".to_string() }
    }

    pub fn from_env() -> Result<Self, String> {
        let key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| "ANTHROPIC_API_KEY not set".to_string())?;
        Ok(Self::new(key))
    }

    fn build_tool_defs(tools: &[ToolSchema]) -> Vec<AnthropicToolDef> {
        tools
            .iter()
            .cloned()
            .map(|s| AnthropicToolDef { name: s.name, description: s.description, input_schema: s.input_schema })
            .collect()
    }

    fn split_system(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system = None;
        let mut rest = Vec::with_capacity(messages.len());
        for m in messages {
            match m.role {
                Role::System => system = Some(m.content.clone()),
                Role::User => rest.push(AnthropicMessage { role: "user".to_string(), content: m.content.clone() }),
                Role::Assistant => rest.push(AnthropicMessage { role: "assistant".to_string(), content: m.content.clone() }),
            }
        }
        (system, rest)
    }
}

#[async_trait]
impl AsyncLlmCaller for AnthropicCaller {
    async fn complete_async(&self, messages: &[Message], tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String> {
        let (system, messages) = Self::split_system(messages);

        let body = AnthropicRequest {
            model: model.to_string(),
            max_tokens: 4096,
            system,
            tools: Self::build_tool_defs(tools),
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Network error: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Anthropic API error {status}: {body}"));
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| format!("Failed to parse Anthropic response: {e}"))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in parsed.content {
            match block {
                AnthropicContentBlock::Text { text } => content.push_str(&text),
                AnthropicContentBlock::ToolUse { name, input } => tool_calls.push(ToolCall { name, args: input }),
            }
        }

        if content.is_empty() && tool_calls.is_empty() {
            return Err("Anthropic returned empty content".to_string());
        }
        Ok(LlmCompletion { content, tool_calls })
    }
}
