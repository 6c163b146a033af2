//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all crew members implement
///
/// Input and output are plain text. The input is the rendered task prompt and
/// the output is the agent's answer, which the crew threads into later tasks.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process a task prompt and return the agent's answer
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Short role title shown in prompts and logs (defaults to the name)
    fn role(&self) -> &str {
        self.name()
    }
}
