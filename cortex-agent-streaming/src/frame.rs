//! Classification of decoded frames.
//!
//! The agent API mixes two conventions: named events (`response.status`,
//! `response.thinking.delta`, ...) and older payloads whose meaning is
//! carried by fields (`object: "message.delta"`, bare `status` objects).
//! [`StreamFrame::classify`] folds both into one closed set of frame kinds so
//! the aggregator can match exhaustively.

use crate::sse::{FramePayload, SseFrame};
use cortex_agent_core::messages::{ToolResult, ToolUse};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Event names understood by the classifier.
pub mod events {
    /// Planning step.
    pub const STATUS: &str = "response.status";
    /// Streaming thinking fragment.
    pub const THINKING_DELTA: &str = "response.thinking.delta";
    /// Complete thinking text.
    pub const THINKING: &str = "response.thinking";
    /// Streaming answer fragment.
    pub const TEXT_DELTA: &str = "response.text.delta";
    /// Complete answer text.
    pub const TEXT: &str = "response.text";
    /// Tool invocation.
    pub const TOOL_USE: &str = "response.tool_use";
    /// Tool result.
    pub const TOOL_RESULT: &str = "response.tool_result";
    /// Final assembled response.
    pub const RESPONSE: &str = "response";
}

/// Legacy status value that only signals the agent stopped.
pub const AGENT_STOP_STATUS: &str = "REASONING_AGENT_STOP";

const THINKING_OPEN: &str = "<thinking>";
const THINKING_CLOSE: &str = "</thinking>";

fn thinking_tags() -> Option<&'static Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"(?s)<thinking>(.*?)</thinking>").ok())
        .as_ref()
}

/// Inner text of the first `<thinking>...</thinking>` block, trimmed.
#[must_use]
pub fn extract_thinking(text: &str) -> Option<&str> {
    thinking_tags()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// One content item of a legacy `message.delta` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyItem {
    /// Answer text fragment.
    Text(String),
    /// Tool invocation.
    ToolUse(ToolUse),
    /// Tool result (`tool_results` item).
    ToolResults(ToolResult),
    /// `tool_result` item; only inspected for verification fields.
    ToolResultInfo(Value),
    /// Anything else.
    Other,
}

impl LegacyItem {
    fn from_value(item: &Value) -> Self {
        let nested = |key: &str| item.get(key).cloned().unwrap_or(Value::Null);
        match item.get("type").and_then(Value::as_str) {
            Some("text") => Self::Text(
                item.get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            Some("tool_use") => Self::ToolUse(ToolUse::from_value(&nested("tool_use"))),
            Some("tool_results") => {
                Self::ToolResults(ToolResult::from_value(&nested("tool_results")))
            }
            Some("tool_result") => Self::ToolResultInfo(nested("tool_result")),
            _ => Self::Other,
        }
    }
}

/// A classified frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Planning step message.
    Status {
        /// The message.
        message: String,
    },
    /// Raw thinking fragment to append.
    ThinkingDelta {
        /// The fragment, exactly as sent minus any literal tag strings.
        text: String,
        /// Thinking stream index.
        content_index: usize,
    },
    /// Authoritative thinking text replacing the stream's content.
    ThinkingComplete {
        /// The thinking text.
        text: String,
        /// Thinking stream index.
        content_index: usize,
    },
    /// Answer text fragment.
    TextDelta {
        /// The fragment.
        text: String,
    },
    /// Tool invocation.
    ToolUse(ToolUse),
    /// Tool result.
    ToolResult(ToolResult),
    /// Legacy `message.delta` content.
    LegacyDelta {
        /// Content items in order.
        items: Vec<LegacyItem>,
    },
    /// Legacy status object.
    LegacyStatus {
        /// Status code, e.g. `PLANNING`.
        status: String,
        /// Human-readable message, if any.
        message: Option<String>,
    },
    /// Observability trace array.
    Trace(Vec<Value>),
    /// Unrecognized payload; may carry tool metadata.
    Other {
        /// `tool_metadata` field, if present.
        tool_metadata: Option<Value>,
    },
    /// Recognized but deliberately not aggregated.
    Ignored {
        /// Why the frame is ignored.
        reason: &'static str,
    },
}

impl StreamFrame {
    /// Classify a decoded frame.
    #[must_use]
    pub fn from_frame(frame: SseFrame) -> Self {
        match frame.payload {
            FramePayload::Trace(items) => Self::Trace(items),
            FramePayload::Json(payload) => Self::classify(frame.event.as_deref(), &payload),
        }
    }

    /// Classify a JSON payload received under `event`.
    #[must_use]
    pub fn classify(event: Option<&str>, payload: &Value) -> Self {
        match event {
            Some(events::STATUS) => match str_field(payload, "message") {
                Some(message) => Self::Status {
                    message: message.to_string(),
                },
                None => Self::ignored("status without message"),
            },
            Some(events::THINKING_DELTA) => Self::thinking(payload, true),
            Some(events::THINKING) => Self::thinking(payload, false),
            Some(events::TEXT_DELTA) => match str_field(payload, "text") {
                Some(text) => Self::TextDelta {
                    text: text.to_string(),
                },
                None => Self::ignored("text delta without text"),
            },
            Some(events::TEXT) => Self::ignored("complete text duplicates deltas"),
            Some(events::TOOL_USE) => Self::ToolUse(ToolUse::from_value(payload)),
            Some(events::TOOL_RESULT) => {
                if payload.get("tool_use_id").is_some() && payload.get("content").is_some() {
                    Self::ToolResult(ToolResult::from_value(payload))
                } else {
                    Self::ignored("tool result without id or content")
                }
            }
            Some(events::RESPONSE) => Self::ignored("final response duplicates deltas"),
            _ => Self::classify_shape(payload),
        }
    }

    fn classify_shape(payload: &Value) -> Self {
        let object = payload.get("object").filter(|o| !o.is_null());

        if object.and_then(Value::as_str) == Some("message.delta") {
            return match payload
                .get("delta")
                .and_then(|d| d.get("content"))
                .and_then(Value::as_array)
            {
                Some(items) => Self::LegacyDelta {
                    items: items.iter().map(LegacyItem::from_value).collect(),
                },
                None => Self::ignored("message delta without content"),
            };
        }

        if str_field(payload, "role") == Some("assistant") && payload.get("content").is_some() {
            return Self::ignored("final message duplicates deltas");
        }

        if object.is_none() {
            if let Some(status) = payload.get("status") {
                let status = status.as_str().unwrap_or_default();
                if status.is_empty() || status == AGENT_STOP_STATUS {
                    return Self::ignored("agent stop status");
                }
                return Self::LegacyStatus {
                    status: status.to_string(),
                    message: str_field(payload, "status_message")
                        .filter(|m| !m.is_empty())
                        .map(str::to_string),
                };
            }
        }

        Self::Other {
            tool_metadata: payload.get("tool_metadata").cloned(),
        }
    }

    fn thinking(payload: &Value, is_delta: bool) -> Self {
        let Some(text) = str_field(payload, "text") else {
            return Self::ignored("thinking without text");
        };
        let content_index = payload
            .get("content_index")
            .and_then(Value::as_u64)
            .map_or(0, |i| i as usize);

        if let Some(inner) = extract_thinking(text) {
            return if inner.is_empty() {
                Self::ignored("empty thinking block")
            } else {
                Self::ThinkingComplete {
                    text: inner.to_string(),
                    content_index,
                }
            };
        }

        if is_delta {
            let fragment = text.replace(THINKING_OPEN, "").replace(THINKING_CLOSE, "");
            if fragment.is_empty() {
                return Self::ignored("empty thinking fragment");
            }
            return Self::ThinkingDelta {
                text: fragment,
                content_index,
            };
        }

        match text.trim() {
            "" => Self::ignored("empty thinking block"),
            trimmed => Self::ThinkingComplete {
                text: trimmed.to_string(),
                content_index,
            },
        }
    }

    fn ignored(reason: &'static str) -> Self {
        Self::Ignored { reason }
    }
}

impl From<SseFrame> for StreamFrame {
    fn from(frame: SseFrame) -> Self {
        Self::from_frame(frame)
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_status_event() {
        let frame = StreamFrame::classify(Some(events::STATUS), &json!({"message": "Planning"}));
        assert_eq!(
            frame,
            StreamFrame::Status {
                message: "Planning".to_string()
            }
        );
        assert!(matches!(
            StreamFrame::classify(Some(events::STATUS), &json!({"status": "x"})),
            StreamFrame::Ignored { .. }
        ));
    }

    #[test]
    fn test_thinking_delta_preserves_spacing() {
        let frame = StreamFrame::classify(
            Some(events::THINKING_DELTA),
            &json!({"text": " data ", "content_index": 2}),
        );
        assert_eq!(
            frame,
            StreamFrame::ThinkingDelta {
                text: " data ".to_string(),
                content_index: 2
            }
        );
    }

    #[test]
    fn test_thinking_delta_strips_partial_tags() {
        let frame = StreamFrame::classify(
            Some(events::THINKING_DELTA),
            &json!({"text": "<thinking>I need"}),
        );
        assert_eq!(
            frame,
            StreamFrame::ThinkingDelta {
                text: "I need".to_string(),
                content_index: 0
            }
        );
    }

    #[rstest]
    #[case(events::THINKING)]
    #[case(events::THINKING_DELTA)]
    fn test_tagged_thinking_is_complete(#[case] event: &str) {
        let frame = StreamFrame::classify(
            Some(event),
            &json!({"text": "<thinking>\n  Query the sales table.\n</thinking>", "content_index": 1}),
        );
        assert_eq!(
            frame,
            StreamFrame::ThinkingComplete {
                text: "Query the sales table.".to_string(),
                content_index: 1
            }
        );
    }

    #[test]
    fn test_untagged_complete_thinking() {
        let frame = StreamFrame::classify(Some(events::THINKING), &json!({"text": "  plan  "}));
        assert_eq!(
            frame,
            StreamFrame::ThinkingComplete {
                text: "plan".to_string(),
                content_index: 0
            }
        );
    }

    #[rstest]
    #[case(Some(events::TEXT), json!({"text": "full answer"}))]
    #[case(Some(events::RESPONSE), json!({"content": []}))]
    #[case(Some(events::TEXT_DELTA), json!({"delta": "x"}))]
    #[case(Some(events::TOOL_RESULT), json!({"content": []}))]
    #[case(None, json!({"role": "assistant", "content": []}))]
    #[case(None, json!({"status": "REASONING_AGENT_STOP", "status_message": "done"}))]
    #[case(None, json!({"object": "message.delta", "delta": {}}))]
    fn test_ignored_frames(#[case] event: Option<&str>, #[case] payload: Value) {
        assert!(matches!(
            StreamFrame::classify(event, &payload),
            StreamFrame::Ignored { .. }
        ));
    }

    #[test]
    fn test_tool_result_event() {
        let frame = StreamFrame::classify(
            Some(events::TOOL_RESULT),
            &json!({"tool_use_id": "t1", "content": [{"json": {"sql": "SELECT 1"}}]}),
        );
        match frame {
            StreamFrame::ToolResult(result) => {
                assert_eq!(result.tool_use_id, "t1");
                assert_eq!(result.sql_query(), Some("SELECT 1"));
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_legacy_delta() {
        let frame = StreamFrame::classify(
            None,
            &json!({
                "object": "message.delta",
                "delta": {"content": [
                    {"type": "text", "text": "Hello"},
                    {"type": "tool_use", "tool_use": {"id": "t1", "name": "analyst"}},
                    {"type": "tool_results", "tool_results": {"tool_use_id": "t1", "content": []}},
                    {"type": "tool_result", "tool_result": {"validated": true}},
                    {"type": "chart"}
                ]}
            }),
        );

        let StreamFrame::LegacyDelta { items } = frame else {
            panic!("expected legacy delta");
        };
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], LegacyItem::Text("Hello".to_string()));
        assert!(matches!(&items[1], LegacyItem::ToolUse(t) if t.name == "analyst"));
        assert!(matches!(&items[2], LegacyItem::ToolResults(r) if r.tool_use_id == "t1"));
        assert!(matches!(&items[3], LegacyItem::ToolResultInfo(_)));
        assert_eq!(items[4], LegacyItem::Other);
    }

    #[test]
    fn test_legacy_status() {
        let frame = StreamFrame::classify(
            None,
            &json!({"status": "PLANNING", "status_message": "Choosing tools"}),
        );
        assert_eq!(
            frame,
            StreamFrame::LegacyStatus {
                status: "PLANNING".to_string(),
                message: Some("Choosing tools".to_string())
            }
        );

        let frame = StreamFrame::classify(None, &json!({"status": "EXECUTING", "object": null}));
        assert_eq!(
            frame,
            StreamFrame::LegacyStatus {
                status: "EXECUTING".to_string(),
                message: None
            }
        );
    }

    #[test]
    fn test_sticky_event_overrides_shape() {
        let frame = StreamFrame::classify(
            Some(events::TEXT_DELTA),
            &json!({"status": "PLANNING", "text": "42"}),
        );
        assert_eq!(
            frame,
            StreamFrame::TextDelta {
                text: "42".to_string()
            }
        );
    }

    #[test]
    fn test_other_with_tool_metadata() {
        let frame = StreamFrame::classify(
            Some("message.unknown"),
            &json!({"object": "tool.call", "tool_metadata": {"name": "search"}}),
        );
        assert_eq!(
            frame,
            StreamFrame::Other {
                tool_metadata: Some(json!({"name": "search"}))
            }
        );
    }

    #[test]
    fn test_trace_payload() {
        let frame = StreamFrame::from_frame(SseFrame {
            event: None,
            payload: FramePayload::Trace(vec![json!("{}")]),
        });
        assert_eq!(frame, StreamFrame::Trace(vec![json!("{}")]));
    }

    #[test]
    fn test_extract_thinking() {
        assert_eq!(extract_thinking("a <thinking> b\n c </thinking> d"), Some("b\n c"));
        assert_eq!(extract_thinking("<thinking>open only"), None);
    }
}
