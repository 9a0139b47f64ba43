//! Agent run request payload.

use serde::{Deserialize, Serialize};

/// Body of an agent run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Conversation messages.
    pub messages: Vec<RequestMessage>,
    /// Tool selection policy.
    pub tool_choice: ToolChoice,
    /// Whether to stream the response.
    pub stream: bool,
}

impl AgentRequest {
    /// A streaming request carrying one user question.
    #[must_use]
    pub fn user(query: impl Into<String>) -> Self {
        Self {
            messages: vec![RequestMessage::user(query)],
            tool_choice: ToolChoice::auto(),
            stream: true,
        }
    }
}

/// One request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Message role.
    pub role: String,
    /// Content items.
    pub content: Vec<RequestContent>,
}

impl RequestMessage {
    /// A user message with a single text item.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![RequestContent::Text { text: text.into() }],
        }
    }
}

/// A request content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
}

/// Tool selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    /// Policy name.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolChoice {
    /// Let the agent pick tools.
    #[must_use]
    pub fn auto() -> Self {
        Self {
            kind: "auto".to_string(),
        }
    }
}
