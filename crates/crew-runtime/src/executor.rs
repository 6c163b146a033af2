//! Agent executor for the tool-calling loop
//!
//! The AgentExecutor implements the loop used by tool-enabled crew members:
//! 1. Call the LLM with the conversation and the available tools
//! 2. Check the stop reason
//! 3. If tool use was requested, execute the tools and loop back
//! 4. Otherwise return the final answer

use crew_core::Result;
use crew_llm::{CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, ToolDefinition};
use crew_tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Callbacks fired while the executor runs
///
/// The CLI uses this to show tool activity when running verbosely.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _name: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }
}

/// Event handler that ignores every event
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of LLM round trips
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt (role, goal and backstory of the agent)
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            model: "mistral".to_string(),
            system_prompt: None,
            max_tokens: 2048,
            temperature: Some(0.1),
        }
    }
}

/// Executes the loop LLM → tool calls → tool results → LLM
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            event_handler: None,
        }
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop for a single user message and return the final answer
    ///
    /// Fails when the provider fails or when `max_iterations` round trips
    /// pass without a final answer.
    pub async fn run(&self, user_message: String) -> Result<String> {
        let mut conversation = vec![Message::user(user_message)];
        let tools = self.build_tool_definitions();
        debug!(tool_count = tools.len(), "Available tools");

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                "Agent iteration started"
            );

            let mut builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                builder = builder.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                builder = builder.temperature(temperature);
            }

            let response = self.provider.complete(builder.build()).await?;

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            match response.stop_reason {
                StopReason::ToolUse if response.message.has_tool_uses() => {
                    let tool_results = self.execute_tools(&response.message).await;
                    conversation.push(response.message);
                    conversation.extend(tool_results);
                }
                StopReason::MaxTokens => {
                    warn!("Hit max tokens in LLM response, returning truncated answer");
                    return Ok(response.text().to_string());
                }
                _ => {
                    let text = response.text().to_string();
                    info!(iteration, response_length = text.len(), "Agent completed");
                    return Ok(text);
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached without a final answer"
        );
        Err(crew_core::Error::ProcessingFailed(format!(
            "no final answer after {} iterations",
            self.config.max_iterations
        )))
    }

    fn build_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Execute the tool calls of an assistant message
    ///
    /// Every call produces exactly one result message; failures and unknown
    /// tools become error results so the model can recover.
    async fn execute_tools(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for block in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            let input_preview: String = input.to_string().chars().take(300).collect();
            info!(tool_name = %name, tool_id = %id, input_preview = %input_preview, "Executing tool");

            let Some(tool) = self.tool_registry.get(name) else {
                warn!(tool_name = %name, "Model requested an unknown tool");
                results.push(Message::tool_error(
                    id.clone(),
                    format!("unknown tool '{name}'"),
                ));
                continue;
            };

            if let Some(handler) = &self.event_handler {
                handler.on_tool_start(name, input).await;
            }

            let start = Instant::now();
            let outcome = tool.execute(input.clone()).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    let result_str = match &result {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    info!(tool_name = %name, duration_ms, result_length = result_str.len(), "Tool execution succeeded");
                    if let Some(handler) = &self.event_handler {
                        handler.on_tool_done(name, Ok(&result), duration_ms).await;
                    }
                    results.push(Message::tool_result(id.clone(), result_str));
                }
                Err(e) => {
                    let error_str = e.to_string();
                    warn!(tool_name = %name, duration_ms, error = %e, "Tool execution failed");
                    if let Some(handler) = &self.event_handler {
                        handler.on_tool_done(name, Err(&error_str), duration_ms).await;
                    }
                    results.push(Message::tool_error(id.clone(), error_str));
                }
            }
        }

        results
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self.provider.ok_or_else(|| {
            crew_core::Error::InitializationFailed("Provider not set".to_string())
        })?;

        let mut executor = AgentExecutor::new(provider, self.tool_registry, self.config);
        executor.event_handler = self.event_handler;
        Ok(executor)
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
