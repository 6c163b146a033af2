//! Tool trait definition

use async_trait::async_trait;
use crew_core::Result;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description the LLM reads to decide when to
/// call it, and a JSON schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with parameters matching [`Tool::input_schema`]
    ///
    /// Failures are returned as errors and reported to the LLM as error tool
    /// results, never folded into the successful output.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Tool name, unique within a registry
    fn name(&self) -> &str;

    /// Description shown to the LLM
    fn description(&self) -> &str;

    /// JSON schema of the tool input
    fn input_schema(&self) -> Value;
}
