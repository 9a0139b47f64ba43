//! # cortex-agent-core
//!
//! Core types, summaries, and error handling for the cortex-agent workspace.
//!
//! This crate provides the foundational types shared by the streaming
//! parser and the HTTP client:
//!
//! - **Messages**: parsed messages, tool uses and tool results
//! - **Timeline**: ordered status/thinking entries for progress replay
//! - **Responses**: [`CortexResponse`], including non-streaming JSON parsing
//! - **Summaries**: the caller-facing [`Summary`] and its error shape
//! - **Errors**: [`CoreError`]
//!
//! ## Example
//!
//! ```rust
//! use cortex_agent_core::{CortexResponse, Summary};
//!
//! let response = CortexResponse::from_json_str(
//!     r#"{"message": {"role": "assistant", "content": [{"type": "text", "text": "42"}]}}"#,
//! )
//! .unwrap();
//!
//! let summary = Summary::extract(&response);
//! assert_eq!(summary.text, "42");
//! assert!(!summary.is_error());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod errors;
pub mod messages;
pub mod response;
pub mod summary;

// Re-exports for convenience
pub use errors::{CoreError, Result};
pub use messages::{
    MessageContent, ParsedMessage, TimelineEntry, ToolResult, ToolUse, ASSISTANT_ROLE,
};
pub use response::CortexResponse;
pub use summary::{Summary, ERROR_PREFIX};
