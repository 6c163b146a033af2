//! LLM provider abstraction layer for stock-crew
//!
//! This crate provides provider-agnostic abstractions for talking to a
//! language model:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Tool definitions for function calling
//! - Provider trait for LLM implementations
//! - Concrete providers for Ollama and OpenAI-compatible servers (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(any(feature = "openai", feature = "ollama"))]
pub mod providers;
