//! Tool invocations and their results.
//!
//! Tool results carry an ordered list of untyped JSON blobs. The agent puts
//! structured output under a `json` key in each blob; the accessors here
//! derive the SQL text, search results and verification flags from them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys collected into [`ToolResult::verification_info`].
pub const VERIFICATION_KEYS: [&str; 5] = [
    "verification",
    "validated",
    "query_verified",
    "verified_query_used",
    "query_validation",
];

/// Flags that mark a result as produced by a verified query, in priority order.
const VERIFIED_FLAGS: [&str; 4] = [
    "verified_query_used",
    "query_verified",
    "validated",
    "verification",
];

/// A tool invocation announced by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Tool use identifier.
    pub id: String,
    /// Tool name (e.g. `cortex_analyst_text_to_sql`).
    pub name: String,
    /// Tool type.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Arguments passed to the tool.
    pub arguments: Map<String, Value>,
}

impl ToolUse {
    /// Create a new tool use.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the tool type.
    #[must_use]
    pub fn with_type(mut self, tool_type: impl Into<String>) -> Self {
        self.tool_type = tool_type.into();
        self
    }

    /// Set the arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Build from a wire object, tolerating missing or mistyped fields.
    ///
    /// Older payloads send arguments as `input`; streamed events name the id
    /// `tool_use_id`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let arguments = value
            .get("arguments")
            .or_else(|| value.get("input"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Self {
            id: string_field(value, "id")
                .or_else(|| string_field(value, "tool_use_id"))
                .unwrap_or_default(),
            name: string_field(value, "name").unwrap_or_default(),
            tool_type: string_field(value, "type").unwrap_or_default(),
            arguments,
        }
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool use this result answers.
    pub tool_use_id: String,
    /// Result blobs, in the order the agent sent them.
    pub content: Vec<Value>,
}

impl ToolResult {
    /// Create a new tool result.
    #[must_use]
    pub fn new(tool_use_id: impl Into<String>, content: Vec<Value>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content,
        }
    }

    /// Build from a wire object, tolerating missing or mistyped fields.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            tool_use_id: string_field(value, "tool_use_id").unwrap_or_default(),
            content: value
                .get("content")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Iterate the `json` objects embedded in the content blobs.
    pub fn json_blobs(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.content
            .iter()
            .filter_map(|item| item.get("json"))
            .filter_map(Value::as_object)
    }

    /// SQL text from the first blob carrying a `sql` key.
    ///
    /// These queries were already executed by the agent; they are exposed
    /// for transparency only.
    #[must_use]
    pub fn sql_query(&self) -> Option<&str> {
        self.json_blobs()
            .find_map(|json| json.get("sql"))
            .and_then(Value::as_str)
    }

    /// All search results across the blobs, concatenated in order.
    #[must_use]
    pub fn search_results(&self) -> Vec<Value> {
        self.json_blobs()
            .filter_map(|json| json.get("searchResults"))
            .filter_map(Value::as_array)
            .flat_map(|results| results.iter().cloned())
            .collect()
    }

    /// Verification-related fields merged across the blobs.
    ///
    /// Later blobs overwrite earlier values of the same key.
    #[must_use]
    pub fn verification_info(&self) -> IndexMap<String, Value> {
        let mut info = IndexMap::new();
        for json in self.json_blobs() {
            for key in VERIFICATION_KEYS {
                if let Some(value) = json.get(key) {
                    info.insert(key.to_string(), value.clone());
                }
            }
        }
        info
    }

    /// Whether any verification flag marks this result as a verified query.
    #[must_use]
    pub fn is_verified_query(&self) -> bool {
        let info = self.verification_info();
        VERIFIED_FLAGS
            .iter()
            .any(|flag| info.get(*flag).is_some_and(is_truthy))
    }
}

/// Loose truthiness for JSON flags: agents send booleans, strings and
/// objects interchangeably for verification markers.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
