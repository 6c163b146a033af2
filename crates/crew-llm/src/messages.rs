//! Message types for LLM communication
//!
//! A conversation is a list of [`Message`]s. Content is either plain text or
//! a list of [`ContentBlock`]s, which is how tool calls and tool results are
//! carried between the executor and a provider.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (most providers take it out of band)
    System,
}

impl Role {
    /// Wire name used by chat-completion APIs
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool use request from the assistant
    ToolUse {
        /// Unique ID for this tool use
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters (JSON)
        input: serde_json::Value,
    },

    /// Tool result sent back on behalf of the user
    ToolResult {
        /// ID of the tool use this is responding to
        tool_use_id: String,
        /// Result content
        content: String,
        /// Whether this is an error result
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message from blocks
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(blocks)),
        }
    }

    /// Create a user message carrying a successful tool result
    pub fn tool_result(tool_use_id: String, result: String) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id,
                content: result,
                is_error: None,
            }])),
        }
    }

    /// Create a user message carrying a failed tool result
    pub fn tool_error(tool_use_id: String, error: String) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id,
                content: error,
                is_error: Some(true),
            }])),
        }
    }

    /// First text content of the message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s),
            Some(MessageContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            }),
            None => None,
        }
    }

    /// Tool use requests carried by an assistant message
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                .collect(),
            _ => vec![],
        }
    }

    /// Check if this message contains any tool uses
    pub fn has_tool_uses(&self) -> bool {
        !self.tool_uses().is_empty()
    }
}
