//! OpenAI-compatible provider
//!
//! Talks to the `/chat/completions` endpoint of OpenAI or of any server that
//! mirrors it (LM Studio, vLLM, llama.cpp server).
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! ```no_run
//! use crew_llm::{CompletionRequest, LLMProvider, Message};
//! use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("not-needed").with_api_base("http://localhost:1234/v1");
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("mistral-7b-instruct")
//!     .add_message(Message::user("Summarize Tesla's last quarter"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, MessageContent,
    Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication (local servers usually ignore it)
    pub api_key: String,

    /// Base URL of the API, without the `/chat/completions` suffix
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible chat-completion provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider from a configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider for api.openai.com with the given key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(super::status_error(status, error_text, &request.model));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        into_completion(openai_response)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build OpenAI messages; the system prompt goes first in the array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(OpenAIMessage::text("system", sys));
    }
    for msg in messages {
        result.extend(convert_message(msg));
    }
    result
}

/// Convert one message; tool results become separate `tool` messages
fn convert_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = msg.role.as_str();
    match msg.content {
        Some(MessageContent::Text(text)) => vec![OpenAIMessage::text(role, text)],
        Some(MessageContent::Blocks(blocks)) => convert_blocks(role, blocks),
        None => vec![OpenAIMessage::text(role, String::new())],
    }
}

fn convert_blocks(role: &'static str, blocks: Vec<ContentBlock>) -> Vec<OpenAIMessage> {
    let mut messages = Vec::new();
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => messages.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    if !text_parts.is_empty() || !tool_calls.is_empty() {
        messages.insert(
            0,
            OpenAIMessage {
                role,
                content: (!text_parts.is_empty()).then(|| text_parts.join("\n")),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            },
        );
    }

    messages
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        crate::LLMError::UnexpectedResponse("No choices in response".to_string())
    })?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    debug!(
        "Received response - stop_reason: {:?}, tokens: {}/{}",
        choice.finish_reason, usage.input_tokens, usage.output_tokens
    );

    Ok(CompletionResponse {
        message: parse_openai_response(choice.message)?,
        stop_reason: map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop")),
        usage,
    })
}

fn parse_openai_response(msg: OpenAIResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let input: serde_json::Value =
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                crate::LLMError::UnexpectedResponse(format!("Failed to parse tool arguments: {e}"))
            })?;
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    if blocks.is_empty() {
        blocks.push(ContentBlock::Text {
            text: String::new(),
        });
    }

    Ok(Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        other => {
            debug!("Unmapped stop reason: {}", other);
            StopReason::EndTurn
        }
    }
}
