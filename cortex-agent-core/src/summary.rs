//! Caller-facing response summaries.
//!
//! A [`Summary`] is derived once from a finished [`CortexResponse`]. Failed
//! requests produce the same shape through [`Summary::error`], so callers can
//! render success and failure uniformly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::ToolResult;
use crate::response::CortexResponse;

/// Prefix of the text of every error summary.
pub const ERROR_PREFIX: &str = "Error: ";

/// Structured result of one agent request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Final answer text, or `"Error: <message>"` on failure.
    pub text: String,
    /// SQL queries executed by the agent, in encounter order.
    pub sql_queries: Vec<String>,
    /// Formatted citations from search results.
    pub citations: Vec<String>,
    /// Follow-up suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Number of tool uses.
    #[serde(default)]
    pub tool_uses: usize,
    /// Number of search results.
    #[serde(default)]
    pub search_results_count: usize,
    /// Verification fields merged across tool results.
    #[serde(default)]
    pub verification_info: IndexMap<String, Value>,
    /// Whether any tool result used a verified query.
    #[serde(default)]
    pub verified_query_used: bool,
    /// Thinking texts in message order.
    #[serde(default)]
    pub planning_updates: Vec<String>,
    /// Request identifier, when the service reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// False for error summaries.
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

impl Summary {
    /// Extract the summary of a finished response.
    ///
    /// Pure: extracting twice from the same response gives equal summaries.
    #[must_use]
    pub fn extract(response: &CortexResponse) -> Self {
        let planning_updates = response
            .messages
            .iter()
            .flat_map(|m| m.thinking())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            text: response.final_text(),
            sql_queries: response.sql_queries(),
            citations: response.citations(),
            suggestions: response.suggestions.clone(),
            tool_uses: response.messages.iter().map(|m| m.tool_uses().count()).sum(),
            search_results_count: response.search_results().len(),
            verification_info: merge_verification(response.tool_results()),
            verified_query_used: response.tool_results().any(ToolResult::is_verified_query),
            planning_updates,
            request_id: response.request_id.clone(),
            success: true,
        }
    }

    /// Build the degraded summary returned for a failed request.
    #[must_use]
    pub fn error(message: impl AsRef<str>) -> Self {
        Self {
            text: format!("{ERROR_PREFIX}{}", message.as_ref()),
            success: false,
            ..Self::default()
        }
    }

    /// Check if this summary reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.success
    }

    /// Whether the answer carries verification evidence.
    #[must_use]
    pub fn has_verification(&self) -> bool {
        self.verified_query_used || !self.verification_info.is_empty()
    }
}

impl From<&CortexResponse> for Summary {
    fn from(response: &CortexResponse) -> Self {
        Self::extract(response)
    }
}

/// Shallow-merge verification info; later results overwrite earlier keys.
#[must_use]
pub fn merge_verification<'a>(
    results: impl IntoIterator<Item = &'a ToolResult>,
) -> IndexMap<String, Value> {
    let mut merged = IndexMap::new();
    for result in results {
        merged.extend(result.verification_info());
    }
    merged
}
