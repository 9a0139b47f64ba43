//! # cortex-agent
//!
//! Streaming response parsing and aggregation for the Cortex Agents API.
//!
//! The agent answers questions over a Server-Sent-Events stream that mixes
//! planning statuses, interleaved thinking streams, answer text, tool
//! invocations and tool results, in both current and legacy payload shapes.
//! This crate reconstructs a structured [`Summary`] from that stream and
//! offers a budgeted live [`Preview`] of progress while it is in flight.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cortex_agent::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CortexClient::from_env()?;
//!     let summary = client.ask("What were sales last quarter?").await;
//!
//!     println!("{}", summary.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Offline Aggregation
//!
//! ```rust
//! use cortex_agent::prelude::*;
//!
//! let response = parse_sse_lines([
//!     "event: response.thinking.delta",
//!     r#"data: {"text": "Look", "content_index": 0}"#,
//!     r#"data: {"text": "ing up data", "content_index": 0}"#,
//!     "event: response.text.delta",
//!     r#"data: {"text": "Revenue grew 5%"}"#,
//!     "data: [DONE]",
//! ]);
//!
//! let summary = Summary::extract(&response);
//! assert_eq!(summary.text, "Revenue grew 5%");
//! assert_eq!(summary.planning_updates, vec!["Looking up data".to_string()]);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `client` | HTTP client ([`CortexClient`]) | ✅ |
//!
//! ## Architecture
//!
//! - [`cortex_agent_core`] - Messages, responses, summaries and errors
//! - [`cortex_agent_streaming`] - SSE decoding, aggregation and previews
//! - `cortex_agent_client` - Streaming HTTP client (optional)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Core types, summaries and errors.
pub use cortex_agent_core as core;
/// SSE decoding, aggregation and previews.
pub use cortex_agent_streaming as streaming;

/// Streaming HTTP client.
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use cortex_agent_client as client;

// Core
pub use cortex_agent_core::{
    CoreError, CortexResponse, MessageContent, ParsedMessage, Summary, TimelineEntry, ToolResult,
    ToolUse,
};

// Streaming
pub use cortex_agent_streaming::{
    parse_sse_lines, parse_transcript, smart_truncate, AggregatedResult, FrameDecoder,
    LineStream, Preview, PreviewConfig, ProgressNotifier, ResponseAggregator, SseFrame,
    StreamError, StreamFrame,
};

// Client
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use cortex_agent_client::{
    ClientConfig, ClientError, CortexClient, ProgressSink, TokenType,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        parse_sse_lines, parse_transcript, smart_truncate, CortexResponse, Preview,
        PreviewConfig, ProgressNotifier, ResponseAggregator, Summary, TimelineEntry,
    };

    #[cfg(feature = "client")]
    pub use crate::{ClientConfig, ClientError, CortexClient, ProgressSink, TokenType};
}
