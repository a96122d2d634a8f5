use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        FunctionObject,
    },
    Client,
};
use async_trait::async_trait;

use crate::llm::AsyncLlmCaller;
use crate::tools::ToolSchema;
use crate::types::{LlmCompletion, Message, Role, ToolCall};

/// Async OpenAI (and OpenAI-compatible) chat completions client, bound
/// into the core via `SyncWrapper`. Streaming is out of scope (no
/// streaming UI).
pub struct OpenAiCaller {
    client: Client<OpenAIConfig>,
}

impl OpenAiCaller {
    /// Standard OpenAI client using the `OPENAI_API_KEY` env var.
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    /// Custom base URL — Groq, Together, Ollama, Fireworks, etc.
    pub fn with_base_url(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_base(api_base).with_api_key(api_key);
        Self { client: Client::with_config(config) }
    }

    fn build_tools(tools: &[ToolSchema]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .cloned()
            .map(|schema| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject { name: schema.name, description: Some(schema.description), parameters: Some(schema.input_schema) },
            })
            .collect()
    }

    fn build_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>, String> {
        messages
            .iter()
            .map(|m| -> Result<ChatCompletionRequestMessage, String> {
                Ok(match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| format!("Failed to build system message: {e}"))?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| format!("Failed to build user message: {e}"))?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| format!("Failed to build assistant message: {e}"))?
                        .into(),
                })
            })
            .collect()
    }
}

impl Default for OpenAiCaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncLlmCaller for OpenAiCaller {
    async fn complete_async(&self, messages: &[Message], tools: &[ToolSchema], model: &str) -> Result<LlmCompletion, String> {
        let built_messages = Self::build_messages(messages)?;
        let oai_tools = Self::build_tools(tools);

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(model).messages(built_messages);
        if !oai_tools.is_empty() {
            request_builder.tools(oai_tools);
        }
        let request = request_builder.build().map_err(|e| format!("Failed to build request: {e}"))?;

        let response = self.client.chat().create(request).await.map_err(|e| format!("OpenAI API error: {e}"))?;

        let choice = response.choices.into_iter().next().ok_or("Empty response from OpenAI")?;
        let message = choice.message;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| -> Result<ToolCall, String> {
                let args = serde_json::from_str(&tc.function.arguments).map_err(|e| format!("Failed to parse tool args: {e}"))?;
                Ok(ToolCall { name: tc.function.name, args })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LlmCompletion { content: message.content.unwrap_or_default(), tool_calls })
    }
}
