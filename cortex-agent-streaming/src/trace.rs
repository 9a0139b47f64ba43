//! Observability trace extraction.
//!
//! Older agent deployments emit `data: [...]` lines whose elements are
//! OpenTelemetry-style spans, each either a JSON object or a JSON string
//! encoding one. The useful bits live in `attributes: [{key, value}]`.

use cortex_agent_core::messages::{MessageContent, ParsedMessage, ToolResult};
use cortex_agent_core::CortexResponse;
use serde_json::{json, Value};
use tracing::debug;

/// Attribute holding the final answer text.
pub const RESPONSE_KEY: &str = "ai.observability.agent.response";
/// Attribute holding an analyst SQL query.
pub const SQL_QUERY_KEY: &str = "ai.observability.agent.tool.cortex_analyst.sql_query";
/// Attribute holding search result strings.
pub const SEARCH_RESULTS_KEY: &str = "ai.observability.agent.tool.cortex_search.results";
/// Attribute holding the request id.
pub const REQUEST_ID_KEY: &str = "ai.observability.agent.request_id";

const ANALYST_TOOL_ID: &str = "cortex_analyst";
const SEARCH_TOOL_ID: &str = "cortex_search";
const SEARCH_DOC_TITLE: &str = "Support Cases";
const SEARCH_TEXT_LIMIT: usize = 1000;

/// Decode one trace element into a span object.
fn span(item: &Value) -> Option<Value> {
    match item {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Skipping undecodable trace element");
                None
            }
        },
        Value::Object(_) => Some(item.clone()),
        _ => None,
    }
}

/// `(key, value)` attribute pairs of every span, in order.
fn attributes(items: &[Value]) -> impl Iterator<Item = (String, Value)> + '_ {
    items.iter().filter_map(span).flat_map(|span| {
        span.get("attributes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|attr| {
                let key = attr.get("key")?.as_str()?.to_string();
                let value = attr.get("value").cloned().unwrap_or(Value::Null);
                Some((key, value))
            })
    })
}

fn string_value(value: &Value) -> &str {
    value
        .get("stringValue")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// First request id found in a trace array.
#[must_use]
pub fn request_id(items: &[Value]) -> Option<String> {
    attributes(items)
        .filter(|(key, _)| key == REQUEST_ID_KEY)
        .map(|(_, value)| string_value(&value).to_string())
        .find(|id| !id.is_empty())
}

/// Accumulates trace arrays into a [`CortexResponse`].
#[derive(Debug, Clone, Default)]
pub struct TraceExtractor {
    response: CortexResponse,
}

impl TraceExtractor {
    /// Create an empty extractor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trace array into the response.
    pub fn extend(&mut self, items: &[Value]) {
        for (key, value) in attributes(items) {
            match key.as_str() {
                RESPONSE_KEY => self.add_answer(string_value(&value).trim()),
                SQL_QUERY_KEY => self.add_sql(string_value(&value).trim()),
                SEARCH_RESULTS_KEY => self.add_search_results(&value),
                REQUEST_ID_KEY => {
                    let id = string_value(&value);
                    if self.response.request_id.is_none() && !id.is_empty() {
                        self.response.request_id = Some(id.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Finish and return the response.
    #[must_use]
    pub fn finish(self) -> CortexResponse {
        self.response
    }

    fn add_answer(&mut self, text: &str) {
        if text.is_empty() || self.response.messages.iter().any(|m| m.text_content() == text) {
            return;
        }
        self.response
            .messages
            .push(ParsedMessage::assistant(vec![MessageContent::text(text)]));
    }

    fn add_sql(&mut self, sql: &str) {
        if sql.is_empty() || self.response.sql_queries().iter().any(|known| known == sql) {
            return;
        }
        self.attach(ToolResult::new(
            ANALYST_TOOL_ID,
            vec![json!({"json": {"sql": sql}})],
        ));
    }

    fn add_search_results(&mut self, value: &Value) {
        let results = value
            .get("arrayValue")
            .and_then(|a| a.get("values"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for (i, result) in results.iter().enumerate() {
            let text = string_value(result);
            if text.is_empty() {
                continue;
            }
            let search_result = json!({
                "text": clip(text, SEARCH_TEXT_LIMIT),
                "doc_title": SEARCH_DOC_TITLE,
                "doc_id": format!("search_result_{}", i + 1),
            });
            self.attach(ToolResult::new(
                SEARCH_TOOL_ID,
                vec![json!({"json": {"searchResults": [search_result]}})],
            ));
        }
    }

    /// Append to the last message, or start an assistant message.
    fn attach(&mut self, result: ToolResult) {
        let item = MessageContent::ToolResults(result);
        match self.response.messages.last_mut() {
            Some(message) => message.content.push(item),
            None => self
                .response
                .messages
                .push(ParsedMessage::assistant(vec![item])),
        }
    }
}

fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let mut clipped: String = text.chars().take(limit).collect();
        clipped.push_str("...");
        clipped
    } else {
        text.to_string()
    }
}

/// Extract a response from a sequence of trace arrays.
#[must_use]
pub fn extract_response<'a>(traces: impl IntoIterator<Item = &'a [Value]>) -> CortexResponse {
    let mut extractor = TraceExtractor::new();
    for items in traces {
        extractor.extend(items);
    }
    extractor.finish()
}
