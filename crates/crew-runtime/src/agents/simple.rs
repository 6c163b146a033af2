//! Simple agent implementation (one LLM completion, no tools)

use crew_core::{Agent, Context, Result};
use crew_llm::{CompletionRequest, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Configuration for a simple agent
#[derive(Debug, Clone)]
pub struct SimpleConfig {
    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,
}

impl Default for SimpleConfig {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            max_tokens: 2048,
            temperature: 0.1,
        }
    }
}

/// An agent that answers each task with a single completion
///
/// This is the agent used in prefetch mode: the data has already been
/// embedded into the task prompt, so no tool loop is needed.
///
/// ```no_run
/// use crew_core::{Agent, Context};
/// use crew_runtime::{SimpleAgent, SimpleConfig};
/// # use std::sync::Arc;
/// # async fn example(provider: Arc<dyn crew_llm::LLMProvider>) -> crew_core::Result<()> {
/// let agent = SimpleAgent::new(provider, SimpleConfig::default(), "researcher");
/// let mut context = Context::new();
/// let summary = agent.process("Summarize this news: ...".to_string(), &mut context).await?;
/// # Ok(())
/// # }
/// ```
pub struct SimpleAgent {
    provider: Arc<dyn LLMProvider>,
    config: SimpleConfig,
    name: String,
}

impl SimpleAgent {
    /// Create a new simple agent
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        config: SimpleConfig,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            config,
            name: name.into(),
        }
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &SimpleConfig {
        &self.config
    }
}

#[async_trait]
impl Agent for SimpleAgent {
    #[instrument(skip(self, input, _context), fields(agent = %self.name))]
    async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
        debug!(prompt_length = input.len(), "Sending single completion");
        let request = CompletionRequest::builder(&self.config.model)
            .messages(vec![Message::user(input)])
            .system(self.config.system_prompt.clone())
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        let response = self.provider.complete(request).await?;
        Ok(response.text().to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockProvider, text_response};
    use crew_llm::LLMError;

    #[test]
    fn test_simple_config_default() {
        let config = SimpleConfig::default();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.max_tokens, 2048);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_process_sends_system_prompt() {
        let mut provider = MockProvider::new();
        provider.expect_complete().times(1).returning(|request| {
            assert_eq!(request.system.as_deref(), Some("You are an advisor"));
            assert_eq!(request.messages[0].text(), Some("AAPL?"));
            assert!(request.tools.is_none());
            Ok(text_response("Hold"))
        });

        let config = SimpleConfig {
            system_prompt: "You are an advisor".to_string(),
            ..SimpleConfig::default()
        };
        let agent = SimpleAgent::new(Arc::new(provider), config, "advisor");
        let mut ctx = Context::new();

        assert_eq!(agent.name(), "advisor");
        assert_eq!(agent.process("AAPL?".to_string(), &mut ctx).await.unwrap(), "Hold");
    }

    #[tokio::test]
    async fn test_process_propagates_provider_failure() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .returning(|_| Err(LLMError::AuthenticationFailed));

        let agent = SimpleAgent::new(Arc::new(provider), SimpleConfig::default(), "advisor");
        let mut ctx = Context::new();
        assert!(agent.process("x".to_string(), &mut ctx).await.is_err());
    }
}
