//! Agent runtime for stock-crew
//!
//! Provides the [`AgentExecutor`] tool-calling loop, the two concrete agent
//! kinds ([`SimpleAgent`] for single completions, [`ToolAgent`] for the tool
//! loop) and the [`AgentRuntime`] that hands out agents sharing one provider.

pub mod agents;
pub mod executor;
pub mod runtime;

pub use agents::{SimpleAgent, SimpleConfig, ToolAgent};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutorConfig, ExecutorEventHandler, NoOpEventHandler,
};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use crew_llm::{
        CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, StopReason,
        TokenUsage,
    };
    use mockall::mock;

    mock! {
        pub Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> crew_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    pub fn tool_call_response(id: &str, tool: &str, input: serde_json::Value) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: tool.to_string(),
                input,
            }]),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }
}
