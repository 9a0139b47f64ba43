//! Message types for agent responses.
//!
//! - **Content**: [`ParsedMessage`] and its [`MessageContent`] items
//! - **Tools**: [`ToolUse`] and [`ToolResult`] with derived SQL, search and
//!   verification views
//! - **Timeline**: [`TimelineEntry`] for ordered status/thinking replay
//!
//! ## Example
//!
//! ```rust
//! use cortex_agent_core::messages::{MessageContent, ParsedMessage};
//!
//! let message = ParsedMessage::assistant(vec![MessageContent::text("Result: 42")]);
//! assert_eq!(message.text_content(), "Result: 42");
//! ```

pub mod content;
pub mod timeline;
pub mod tool;

pub use content::{MessageContent, ParsedMessage, ASSISTANT_ROLE};
pub use timeline::TimelineEntry;
pub use tool::{is_truthy, ToolResult, ToolUse, VERIFICATION_KEYS};
