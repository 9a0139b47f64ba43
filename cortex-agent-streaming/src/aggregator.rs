//! Incremental response aggregation.
//!
//! [`ResponseAggregator`] owns the decoder state and the accumulated result
//! of exactly one stream. Feed it lines (or already decoded frames) and call
//! [`ResponseAggregator::finalize`] when the stream ends.

use chrono::{DateTime, Utc};
use cortex_agent_core::messages::{
    MessageContent, ParsedMessage, TimelineEntry, ToolResult, ToolUse, VERIFICATION_KEYS,
};
use cortex_agent_core::{CortexResponse, Summary};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::frame::{LegacyItem, StreamFrame};
use crate::sse::{DecodedLine, FrameDecoder, SseFrame};
use crate::thinking::ThinkingStreams;
use crate::trace;

/// Legacy text is echoed to debug logs until it grows past this many chars.
const TEXT_PREVIEW_LIMIT: usize = 200;

/// Everything accumulated from one stream so far.
#[derive(Debug, Clone)]
pub struct AggregatedResult {
    /// Answer text.
    pub text: String,
    /// Tool invocations in arrival order.
    pub tool_uses: Vec<ToolUse>,
    /// Tool results in arrival order.
    pub tool_results: Vec<ToolResult>,
    /// Thinking text per content index.
    pub thinking: ThinkingStreams,
    /// Status and thinking entries in arrival order.
    pub timeline: Vec<TimelineEntry>,
    /// Status messages in arrival order.
    pub status_messages: Vec<String>,
    /// Request id, when a trace carried one.
    pub request_id: Option<String>,
    /// When aggregation started.
    pub started_at: DateTime<Utc>,
}

impl Default for AggregatedResult {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregatedResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            tool_uses: Vec::new(),
            tool_results: Vec::new(),
            thinking: ThinkingStreams::new(),
            timeline: Vec::new(),
            status_messages: Vec::new(),
            request_id: None,
            started_at: Utc::now(),
        }
    }

    /// Time since aggregation started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Check if nothing answer-bearing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tool_uses.is_empty() && self.tool_results.is_empty()
    }

    fn push_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.timeline.push(TimelineEntry::status(message.clone()));
        self.status_messages.push(message);
    }

    /// Update the timeline entry for `index` in place, or append one.
    fn upsert_thinking(&mut self, index: usize, content: &str) {
        let existing = self
            .timeline
            .iter_mut()
            .rev()
            .find(|entry| entry.content_index() == Some(index));
        match existing {
            Some(entry) => *entry = TimelineEntry::thinking(content, index),
            None => self.timeline.push(TimelineEntry::thinking(content, index)),
        }
    }
}

/// What a single ingest changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ingest {
    /// Nothing.
    Ignored,
    /// Answer content only; the progress preview is unchanged.
    Content,
    /// Status or thinking; the progress preview should be refreshed.
    Progress,
}

impl Ingest {
    /// Check if the progress preview should be refreshed.
    #[must_use]
    pub fn is_progress(self) -> bool {
        self == Self::Progress
    }
}

/// Outcome of feeding one raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line carried no frame, or the stream already ended.
    Skipped,
    /// A frame was ingested.
    Ingested(Ingest),
    /// The `[DONE]` sentinel arrived.
    Done,
}

/// Aggregates one stream into an [`AggregatedResult`].
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    decoder: FrameDecoder,
    result: AggregatedResult,
    tools_seen: HashSet<String>,
    done: bool,
}

impl ResponseAggregator {
    /// Create a new aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and ingest one raw SSE line.
    pub fn ingest_line(&mut self, line: &str) -> LineOutcome {
        if self.done {
            return LineOutcome::Skipped;
        }
        match self.decoder.decode_line(line) {
            None => LineOutcome::Skipped,
            Some(DecodedLine::Done) => {
                debug!(
                    skipped = self.decoder.skipped(),
                    text_len = self.result.text.len(),
                    "Stream finished"
                );
                self.done = true;
                LineOutcome::Done
            }
            Some(DecodedLine::Frame(frame)) => LineOutcome::Ingested(self.ingest(frame)),
        }
    }

    /// Ingest one decoded frame.
    pub fn ingest(&mut self, frame: SseFrame) -> Ingest {
        if self.done {
            return Ingest::Ignored;
        }
        self.apply(StreamFrame::from_frame(frame))
    }

    /// Apply one classified frame.
    pub fn apply(&mut self, frame: StreamFrame) -> Ingest {
        if self.done {
            return Ingest::Ignored;
        }

        match frame {
            StreamFrame::Status { message } => {
                self.result.push_status(message);
                Ingest::Progress
            }
            StreamFrame::ThinkingDelta {
                text,
                content_index,
            } => {
                let accumulated = self
                    .result
                    .thinking
                    .append(content_index, &text)
                    .trim()
                    .to_string();
                if !accumulated.is_empty() {
                    self.result.upsert_thinking(content_index, &accumulated);
                }
                Ingest::Progress
            }
            StreamFrame::ThinkingComplete {
                text,
                content_index,
            } => {
                self.result.upsert_thinking(content_index, &text);
                self.result.thinking.replace(content_index, text);
                Ingest::Progress
            }
            StreamFrame::TextDelta { text } => {
                self.result.text.push_str(&text);
                Ingest::Content
            }
            StreamFrame::ToolUse(tool) => {
                self.result.tool_uses.push(tool);
                Ingest::Content
            }
            StreamFrame::ToolResult(result) => {
                self.result.tool_results.push(result);
                Ingest::Content
            }
            StreamFrame::LegacyDelta { items } => items
                .into_iter()
                .map(|item| self.apply_legacy(item))
                .max()
                .unwrap_or(Ingest::Ignored),
            StreamFrame::LegacyStatus { status, message } => match message {
                Some(message) => {
                    self.result.push_status(message);
                    Ingest::Progress
                }
                None => {
                    debug!(status = %status, "Status without message");
                    Ingest::Ignored
                }
            },
            StreamFrame::Trace(items) => {
                if self.result.request_id.is_some() {
                    return Ingest::Ignored;
                }
                match trace::request_id(&items) {
                    Some(id) => {
                        debug!(request_id = %id, "Request id from trace");
                        self.result.request_id = Some(id);
                        Ingest::Content
                    }
                    None => Ingest::Ignored,
                }
            }
            StreamFrame::Other { tool_metadata } => {
                if let Some(metadata) = tool_metadata {
                    debug!(metadata = %metadata, "Tool metadata");
                }
                Ingest::Ignored
            }
            StreamFrame::Ignored { reason } => {
                debug!(reason, "Frame ignored");
                Ingest::Ignored
            }
        }
    }

    fn apply_legacy(&mut self, item: LegacyItem) -> Ingest {
        match item {
            LegacyItem::Text(text) => {
                self.result.text.push_str(&text);
                if self.result.text.chars().count() < TEXT_PREVIEW_LIMIT {
                    debug!(text = %self.result.text, "Text so far");
                }
                Ingest::Content
            }
            LegacyItem::ToolUse(tool) => {
                let name = if tool.name.is_empty() {
                    "unknown".to_string()
                } else {
                    tool.name.clone()
                };
                self.result.tool_uses.push(tool);
                if self.tools_seen.insert(name.clone()) {
                    self.result.push_status(format!("Using {name}"));
                    Ingest::Progress
                } else {
                    Ingest::Content
                }
            }
            LegacyItem::ToolResults(result) => {
                self.result.tool_results.push(result);
                Ingest::Content
            }
            LegacyItem::ToolResultInfo(info) => {
                if has_verification_fields(&info) {
                    debug!(info = %info, "Tool result verification fields");
                }
                Ingest::Ignored
            }
            LegacyItem::Other => Ingest::Ignored,
        }
    }

    /// The accumulated result so far.
    #[must_use]
    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    /// Check if the `[DONE]` sentinel has been seen.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Build the final response.
    ///
    /// One thinking message per non-empty slot in index order, then the
    /// answer message if anything answer-bearing arrived.
    #[must_use]
    pub fn finalize(&self) -> CortexResponse {
        let mut response = CortexResponse::new();

        response.messages.extend(
            self.result
                .thinking
                .iter()
                .map(|(_, text)| ParsedMessage::assistant(vec![MessageContent::thinking(text)])),
        );

        if !self.result.is_empty() {
            let mut content = Vec::new();
            if !self.result.text.is_empty() {
                content.push(MessageContent::text(self.result.text.clone()));
            }
            content.extend(self.result.tool_uses.iter().cloned().map(MessageContent::ToolUse));
            content.extend(
                self.result
                    .tool_results
                    .iter()
                    .cloned()
                    .map(MessageContent::ToolResults),
            );
            response.messages.push(ParsedMessage::assistant(content));
        }

        response.status_messages = self.result.status_messages.clone();
        response.request_id = self.result.request_id.clone();
        response
    }

    /// Finalize and extract the summary.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary::extract(&self.finalize())
    }

    /// Consume the aggregator, returning the accumulated result.
    #[must_use]
    pub fn into_result(self) -> AggregatedResult {
        self.result
    }
}

/// Check whether a legacy tool result carries any verification field.
#[must_use]
pub fn has_verification_fields(value: &Value) -> bool {
    VERIFICATION_KEYS.iter().any(|key| value.get(*key).is_some())
}
