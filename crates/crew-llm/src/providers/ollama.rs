//! Ollama provider
//!
//! Talks to a local Ollama server through its `/api/chat` endpoint with
//! streaming disabled. Ollama does not assign ids to tool calls, so ids are
//! synthesized from the call position.
//! See: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, MessageContent,
    Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server URL, e.g. `http://localhost:11434`
    pub base_url: String,

    /// Request timeout in seconds; local models can be slow to load
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Set the server URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Ollama chat provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a provider from a configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    #[instrument(skip(self, request), fields(model = %request.model, base_url = %self.config.base_url))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = build_chat_request(request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(super::status_error(status, error_text, &model));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Received response - done_reason: {:?}, tokens: {:?}/{:?}",
            chat.done_reason, chat.prompt_eval_count, chat.eval_count
        );

        Ok(into_completion(chat))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatToolFunction,
}

#[derive(Debug, Serialize)]
struct ChatToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

// ============================================================================
// Conversion functions
// ============================================================================

fn build_chat_request(request: CompletionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system,
            tool_calls: Vec::new(),
        });
    }
    for msg in request.messages {
        messages.extend(convert_message(msg));
    }

    ChatRequest {
        model: request.model,
        messages,
        stream: false,
        options: ChatOptions {
            num_predict: request.max_tokens,
            temperature: request.temperature,
        },
        tools: request
            .tools
            .as_deref()
            .map(convert_tools)
            .unwrap_or_default(),
    }
}

fn convert_message(msg: Message) -> Vec<ChatMessage> {
    let role = msg.role.as_str().to_string();
    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => {
            return vec![ChatMessage {
                role,
                content: text,
                tool_calls: Vec::new(),
            }];
        }
        Some(MessageContent::Blocks(blocks)) => blocks,
        None => Vec::new(),
    };

    let mut out = Vec::new();
    let mut text = Vec::new();
    let mut tool_calls = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push(t),
            ContentBlock::ToolUse { name, input, .. } => tool_calls.push(ChatToolCall {
                function: ChatFunctionCall {
                    name,
                    arguments: input,
                },
            }),
            ContentBlock::ToolResult { content, .. } => out.push(ChatMessage {
                role: "tool".to_string(),
                content,
                tool_calls: Vec::new(),
            }),
        }
    }
    if !text.is_empty() || !tool_calls.is_empty() || out.is_empty() {
        out.insert(
            0,
            ChatMessage {
                role,
                content: text.join("\n"),
                tool_calls,
            },
        );
    }
    out
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            tool_type: "function",
            function: ChatToolFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn into_completion(chat: ChatResponse) -> CompletionResponse {
    let mut blocks = Vec::new();
    if !chat.message.content.is_empty() {
        blocks.push(ContentBlock::Text {
            text: chat.message.content,
        });
    }

    let has_tool_calls = !chat.message.tool_calls.is_empty();
    for (i, call) in chat.message.tool_calls.into_iter().enumerate() {
        blocks.push(ContentBlock::ToolUse {
            id: format!("call_{i}"),
            name: call.function.name,
            input: call.function.arguments,
        });
    }
    if blocks.is_empty() {
        blocks.push(ContentBlock::Text {
            text: String::new(),
        });
    }

    let stop_reason = if has_tool_calls {
        StopReason::ToolUse
    } else {
        match chat.done_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    };

    CompletionResponse {
        message: Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(blocks)),
        },
        stop_reason,
        usage: TokenUsage {
            input_tokens: chat.prompt_eval_count.unwrap_or(0),
            output_tokens: chat.eval_count.unwrap_or(0),
        },
    }
}
