//! Complete agent responses.

use serde_json::Value;

use crate::errors::{CoreError, Result};
use crate::messages::{ParsedMessage, ToolResult};

/// A fully parsed agent response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CortexResponse {
    /// Messages; the final answer is the last assistant message.
    pub messages: Vec<ParsedMessage>,
    /// Follow-up question suggestions.
    pub suggestions: Vec<String>,
    /// Planning steps reported while streaming.
    pub status_messages: Vec<String>,
    /// Request identifier assigned by the service.
    pub request_id: Option<String>,
}

impl CortexResponse {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a non-streaming JSON response body.
    pub fn from_json_str(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_json(&value)
    }

    /// Parse a non-streaming JSON response.
    ///
    /// Reads `request_id`, the single `message` and `suggestions`.
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CoreError::invalid_response("expected a JSON object"));
        }

        let mut response = Self::new();
        response.request_id = value
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(message) = value.get("message") {
            response.messages.push(ParsedMessage::from_value(message));
        }

        if let Some(suggestions) = value.get("suggestions").and_then(Value::as_array) {
            response.suggestions = suggestions
                .iter()
                .filter_map(|s| match s {
                    Value::String(text) => Some(text.clone()),
                    other => other.get("text").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
        }

        Ok(response)
    }

    /// Text of the last assistant message, or empty.
    #[must_use]
    pub fn final_text(&self) -> String {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(ParsedMessage::text_content)
            .unwrap_or_default()
    }

    /// Every tool result across all messages, in order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.messages.iter().flat_map(ParsedMessage::tool_results)
    }

    /// SQL queries executed by the agent, one per tool result at most.
    #[must_use]
    pub fn sql_queries(&self) -> Vec<String> {
        self.tool_results()
            .filter_map(ToolResult::sql_query)
            .filter(|sql| !sql.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Search results across all tool results.
    #[must_use]
    pub fn search_results(&self) -> Vec<Value> {
        self.tool_results()
            .flat_map(|r| r.search_results())
            .collect()
    }

    /// Citations formatted from search results carrying a title and text.
    #[must_use]
    pub fn citations(&self) -> Vec<String> {
        self.search_results()
            .iter()
            .filter_map(format_citation)
            .collect()
    }
}

fn format_citation(result: &Value) -> Option<String> {
    let title = result.get("doc_title")?;
    let text = result.get("text")?;
    let mut citation = format!("{}: {}", display(title), display(text));
    if let Some(doc_id) = result.get("doc_id") {
        citation.push_str(&format!(" [Source: {}]", display(doc_id)));
    }
    Some(citation)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageContent;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn search_response(results: Value) -> CortexResponse {
        let mut response = CortexResponse::new();
        response.messages.push(ParsedMessage::assistant(vec![
            MessageContent::ToolResults(ToolResult::new(
                "search",
                vec![json!({"json": {"searchResults": results}})],
            )),
        ]));
        response
    }

    #[test]
    fn test_from_json() {
        let response = CortexResponse::from_json_str(
            r#"{
                "request_id": "req-1",
                "message": {"role": "assistant", "content": [{"type": "text", "text": "Hi"}]},
                "suggestions": ["What about last year?", {"text": "By region?"}, 7]
            }"#,
        )
        .unwrap();

        assert_eq!(response.request_id.as_deref(), Some("req-1"));
        assert_eq!(response.final_text(), "Hi");
        assert_eq!(
            response.suggestions,
            vec!["What about last year?".to_string(), "By region?".to_string()]
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(CortexResponse::from_json(&json!([1, 2])).is_err());
        assert!(CortexResponse::from_json_str("not json").is_err());
    }

    #[test]
    fn test_final_text_scans_from_the_end() {
        let mut response = CortexResponse::new();
        response
            .messages
            .push(ParsedMessage::assistant(vec![MessageContent::text("first")]));
        response
            .messages
            .push(ParsedMessage::assistant(vec![MessageContent::text("last")]));
        response
            .messages
            .push(ParsedMessage::new("user", vec![MessageContent::text("question")]));

        assert_eq!(response.final_text(), "last");
        assert_eq!(CortexResponse::new().final_text(), "");
    }

    #[test]
    fn test_citations() {
        let response = search_response(json!([
            {"doc_title": "Guide", "text": "Step one", "doc_id": "doc-9"},
            {"doc_title": "Notes", "text": "No id"},
            {"text": "Missing title"}
        ]));

        assert_eq!(
            response.citations(),
            vec![
                "Guide: Step one [Source: doc-9]".to_string(),
                "Notes: No id".to_string(),
            ]
        );
        assert_eq!(response.search_results().len(), 3);
    }

    #[test]
    fn test_sql_queries_skip_empty() {
        let mut response = CortexResponse::new();
        response.messages.push(ParsedMessage::assistant(vec![
            MessageContent::ToolResults(ToolResult::new("a", vec![json!({"json": {"sql": ""}})])),
            MessageContent::ToolResults(ToolResult::new(
                "b",
                vec![json!({"json": {"sql": "SELECT 1"}})],
            )),
        ]));
        assert_eq!(response.sql_queries(), vec!["SELECT 1".to_string()]);
    }
}
