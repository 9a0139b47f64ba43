//! Parsed message content.
//!
//! Content items arrive as `{"type": ..., <type>: {...}}` objects. Unknown
//! item types are kept verbatim so nothing the agent sent is lost.

use serde_json::{json, Value};

use super::tool::{ToolResult, ToolUse};

/// Role assigned to agent-authored messages.
pub const ASSISTANT_ROLE: &str = "assistant";

/// One content item of a parsed message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Answer text.
    Text {
        /// The text.
        text: String,
    },
    /// Planning/reasoning text.
    Thinking {
        /// The thinking text.
        text: String,
    },
    /// A tool invocation.
    ToolUse(ToolUse),
    /// A tool result. Both `tool_results` and `tool_result` item types map here.
    ToolResults(ToolResult),
    /// Any other item, kept as sent.
    Other(Value),
}

impl MessageContent {
    /// Create a text item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a thinking item.
    #[must_use]
    pub fn thinking(text: impl Into<String>) -> Self {
        Self::Thinking { text: text.into() }
    }

    /// Parse a wire content item.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let text = || {
            value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let nested = |key: &str| value.get(key).cloned().unwrap_or_else(|| json!({}));

        match value.get("type").and_then(Value::as_str) {
            Some("text") => Self::Text { text: text() },
            Some("thinking") => Self::Thinking { text: text() },
            Some("tool_use") => Self::ToolUse(ToolUse::from_value(&nested("tool_use"))),
            Some("tool_results") => {
                Self::ToolResults(ToolResult::from_value(&nested("tool_results")))
            }
            Some("tool_result") => {
                Self::ToolResults(ToolResult::from_value(&nested("tool_result")))
            }
            _ => Self::Other(value.clone()),
        }
    }

    /// Render back to the wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text { text } => json!({"type": "text", "text": text}),
            Self::Thinking { text } => json!({"type": "thinking", "text": text}),
            Self::ToolUse(tool) => json!({"type": "tool_use", "tool_use": tool}),
            Self::ToolResults(result) => json!({"type": "tool_results", "tool_results": result}),
            Self::Other(value) => value.clone(),
        }
    }

    /// Get the item type name.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Thinking { .. } => "thinking",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResults(_) => "tool_results",
            Self::Other(value) => value.get("type").and_then(Value::as_str).unwrap_or("other"),
        }
    }
}

/// A message reconstructed from an agent response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    /// Message role.
    pub role: String,
    /// Content items in arrival order.
    pub content: Vec<MessageContent>,
}

impl ParsedMessage {
    /// Create a message with the given role.
    #[must_use]
    pub fn new(role: impl Into<String>, content: Vec<MessageContent>) -> Self {
        Self {
            role: role.into(),
            content,
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: Vec<MessageContent>) -> Self {
        Self::new(ASSISTANT_ROLE, content)
    }

    /// Parse a wire message; the role defaults to assistant.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let role = value
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or(ASSISTANT_ROLE);
        let content = value
            .get("content")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(MessageContent::from_value).collect())
            .unwrap_or_default();
        Self::new(role, content)
    }

    /// Check if this is an assistant message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == ASSISTANT_ROLE
    }

    /// Concatenated text items.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Thinking texts in order.
    pub fn thinking(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|item| match item {
            MessageContent::Thinking { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool uses in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(|item| match item {
            MessageContent::ToolUse(tool) => Some(tool),
            _ => None,
        })
    }

    /// Tool results in order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.content.iter().filter_map(|item| match item {
            MessageContent::ToolResults(result) => Some(result),
            _ => None,
        })
    }
}
