//! # cortex-agent-streaming
//!
//! Streaming support for cortex-agent.
//!
//! This crate turns a Server-Sent-Events feed from the agent API into a
//! structured response, incrementally:
//!
//! ## Core Concepts
//!
//! - **[`LineDecoder`] / [`LineStream`]**: split byte chunks into lines
//! - **[`FrameDecoder`]**: turn lines into frames, tracking the sticky event
//!   name and the `[DONE]` sentinel
//! - **[`StreamFrame`]**: one closed enum over every event convention
//! - **[`ResponseAggregator`]**: accumulate frames into an [`AggregatedResult`]
//!   and finalize it into a [`CortexResponse`](cortex_agent_core::CortexResponse)
//! - **[`ProgressNotifier`]**: budgeted live previews of status and thinking
//! - **Traces and transcripts**: read legacy observability payloads and
//!   recorded captures
//!
//! ## Example
//!
//! ```rust
//! use cortex_agent_streaming::{ProgressNotifier, ResponseAggregator};
//!
//! let mut aggregator = ResponseAggregator::new();
//! let notifier = ProgressNotifier::default();
//!
//! for line in [
//!     "event: response.status",
//!     r#"data: {"message": "Searching tables"}"#,
//!     "event: response.text.delta",
//!     r#"data: {"text": "Result: 42"}"#,
//!     "data: [DONE]",
//! ] {
//!     aggregator.ingest_line(line);
//! }
//!
//! assert_eq!(
//!     notifier.render(aggregator.result()),
//!     "Thinking...\n\n• Searching tables"
//! );
//! assert_eq!(aggregator.summary().text, "Result: 42");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod aggregator;
pub mod error;
pub mod frame;
pub mod preview;
pub mod sse;
pub mod thinking;
pub mod trace;
pub mod transcript;

// Re-exports
pub use aggregator::{AggregatedResult, Ingest, LineOutcome, ResponseAggregator};
pub use error::{StreamError, StreamResult};
pub use frame::{LegacyItem, StreamFrame};
pub use preview::{smart_truncate, Preview, PreviewConfig, ProgressNotifier};
pub use sse::{
    DecodedLine, FrameDecoder, FramePayload, LineDecoder, LineStream, SseFrame, DATA_PREFIX,
};
pub use thinking::ThinkingStreams;
pub use trace::TraceExtractor;
pub use transcript::{parse_sse_lines, parse_transcript};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        smart_truncate, AggregatedResult, Ingest, LineOutcome, LineStream, Preview,
        PreviewConfig, ProgressNotifier, ResponseAggregator, StreamError, StreamFrame,
        StreamResult,
    };
}
