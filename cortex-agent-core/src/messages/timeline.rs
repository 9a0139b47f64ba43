//! Chronological progress timeline.

use serde::{Deserialize, Serialize};

/// One entry of the status/thinking timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEntry {
    /// A planning/status step.
    Status {
        /// Status message.
        content: String,
    },
    /// The current text of one thinking stream.
    Thinking {
        /// Thinking text, trimmed.
        content: String,
        /// Thinking stream this entry mirrors.
        content_index: usize,
    },
}

impl TimelineEntry {
    /// Create a status entry.
    #[must_use]
    pub fn status(content: impl Into<String>) -> Self {
        Self::Status {
            content: content.into(),
        }
    }

    /// Create a thinking entry.
    #[must_use]
    pub fn thinking(content: impl Into<String>, content_index: usize) -> Self {
        Self::Thinking {
            content: content.into(),
            content_index,
        }
    }

    /// Get the entry text.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Status { content } | Self::Thinking { content, .. } => content,
        }
    }

    /// Thinking stream index, for thinking entries.
    #[must_use]
    pub fn content_index(&self) -> Option<usize> {
        match self {
            Self::Status { .. } => None,
            Self::Thinking { content_index, .. } => Some(*content_index),
        }
    }

    /// Check if this is a status entry.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}
