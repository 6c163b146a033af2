//! Runtime holding the shared LLM provider and model defaults
//!
//! Every crew member is created through the runtime so they all talk to the
//! same provider with the same model settings.

use crew_core::Result;
use crew_llm::LLMProvider;
use crew_tools::ToolRegistry;
use std::sync::Arc;

use crate::agents::{SimpleAgent, SimpleConfig, ToolAgent};
use crate::executor::{AgentExecutor, ExecutorConfig, ExecutorEventHandler};

/// Model defaults applied to every agent created by the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Default maximum iterations for tool-using agents
    pub default_max_iterations: usize,

    /// Default model to use
    pub default_model: String,

    /// Default sampling temperature
    pub default_temperature: f32,

    /// Default completion size
    pub default_max_tokens: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_max_iterations: 5,
            default_model: "mistral".to_string(),
            default_temperature: 0.1,
            default_max_tokens: 2048,
        }
    }
}

/// Shared runtime for crew members
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            event_handler: None,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Single-completion config with the runtime defaults
    pub fn simple_config(&self, system_prompt: impl Into<String>) -> SimpleConfig {
        SimpleConfig {
            model: self.config.default_model.clone(),
            system_prompt: system_prompt.into(),
            max_tokens: self.config.default_max_tokens,
            temperature: self.config.default_temperature,
        }
    }

    /// Tool-loop config with the runtime defaults
    pub fn executor_config(&self, system_prompt: impl Into<String>) -> ExecutorConfig {
        ExecutorConfig {
            max_iterations: self.config.default_max_iterations,
            model: self.config.default_model.clone(),
            system_prompt: Some(system_prompt.into()),
            max_tokens: self.config.default_max_tokens,
            temperature: Some(self.config.default_temperature),
        }
    }

    /// Create a simple agent (LLM only, no tools)
    pub fn create_simple_agent(
        &self,
        config: SimpleConfig,
        name: impl Into<String>,
    ) -> SimpleAgent {
        SimpleAgent::new(self.provider.clone(), config, name)
    }

    /// Create a tool-using agent over its own tool registry
    pub fn create_tool_agent(
        &self,
        config: ExecutorConfig,
        tools: Arc<ToolRegistry>,
        name: impl Into<String>,
    ) -> ToolAgent {
        let mut executor = AgentExecutor::new(self.provider.clone(), tools, config);
        if let Some(handler) = &self.event_handler {
            executor = executor.with_event_handler(handler.clone());
        }
        ToolAgent::new(executor, name)
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default max iterations
    pub fn default_max_iterations(mut self, max: usize) -> Self {
        self.config.default_max_iterations = max;
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    /// Set the default temperature
    pub fn default_temperature(mut self, temperature: f32) -> Self {
        self.config.default_temperature = temperature;
        self
    }

    /// Attach an event handler to every tool agent
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self.provider.ok_or_else(|| {
            crew_core::Error::InitializationFailed("Provider not set".to_string())
        })?;

        let mut runtime = AgentRuntime::new(provider, self.config);
        runtime.event_handler = self.event_handler;
        Ok(runtime)
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockProvider, text_response};
    use crew_core::{Agent, Context};

    #[test]
    fn test_runtime_config_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.default_max_iterations, 5);
        assert_eq!(config.default_model, "mistral");
    }

    #[test]
    fn test_runtime_builder() {
        let builder = AgentRuntimeBuilder::new()
            .default_max_iterations(3)
            .default_model("llama3")
            .default_temperature(0.3);

        assert_eq!(builder.config.default_max_iterations, 3);
        assert_eq!(builder.config.default_model, "llama3");
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_configs_inherit_defaults() {
        let runtime = AgentRuntime::builder()
            .provider(Arc::new(MockProvider::new()))
            .default_model("llama3")
            .build()
            .unwrap();

        let simple = runtime.simple_config("advisor prompt");
        assert_eq!(simple.model, "llama3");
        assert_eq!(simple.system_prompt, "advisor prompt");

        let exec = runtime.executor_config("analyst prompt");
        assert_eq!(exec.model, "llama3");
        assert_eq!(exec.max_iterations, 5);
        assert_eq!(exec.system_prompt.as_deref(), Some("analyst prompt"));
    }

    #[tokio::test]
    async fn test_agents_share_provider() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(2)
            .returning(|request| Ok(text_response(&format!("model={}", request.model))));

        let runtime = AgentRuntime::new(Arc::new(provider), RuntimeConfig::default());
        let simple = runtime.create_simple_agent(runtime.simple_config("s"), "advisor");
        let tool = runtime.create_tool_agent(
            runtime.executor_config("t"),
            Arc::new(ToolRegistry::new()),
            "researcher",
        );

        let mut ctx = Context::new();
        assert_eq!(simple.process("a".into(), &mut ctx).await.unwrap(), "model=mistral");
        assert_eq!(tool.process("b".into(), &mut ctx).await.unwrap(), "model=mistral");
    }
}
