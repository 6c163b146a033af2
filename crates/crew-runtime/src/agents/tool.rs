//! Tool agent implementation (wraps AgentExecutor)

use crate::executor::AgentExecutor;
use crew_core::{Agent, Context, Result};
use async_trait::async_trait;

/// An agent that answers tasks through the tool-calling loop
pub struct ToolAgent {
    executor: AgentExecutor,
    name: String,
}

impl ToolAgent {
    /// Create a new tool agent
    pub fn new(executor: AgentExecutor, name: impl Into<String>) -> Self {
        Self {
            executor,
            name: name.into(),
        }
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }
}

#[async_trait]
impl Agent for ToolAgent {
    async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
        self.executor.run(input).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::AgentExecutorBuilder;
    use crate::test_support::{MockProvider, text_response};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_tool_agent_delegates_to_executor() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Ok(text_response("research done")));

        let executor = AgentExecutorBuilder::new()
            .provider(Arc::new(provider))
            .system_prompt("You are a Staff Research Analyst")
            .build()
            .unwrap();
        let agent = ToolAgent::new(executor, "researcher");
        let mut ctx = Context::new();

        assert_eq!(agent.name(), "researcher");
        assert_eq!(
            agent.executor().config().system_prompt.as_deref(),
            Some("You are a Staff Research Analyst")
        );
        assert_eq!(
            agent.process("go".to_string(), &mut ctx).await.unwrap(),
            "research done"
        );
    }
}
