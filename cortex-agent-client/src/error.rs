//! Client error types.

use cortex_agent_core::{CoreError, Summary};
use cortex_agent_streaming::StreamError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while running an agent request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The whole request exceeded its deadline.
    #[error("Request took longer than {}", describe_duration(.0))]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Transport failure.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The byte stream could not be decoded.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// A non-streaming body could not be parsed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A progress sink rejected an update.
    #[error("Progress sink error: {0}")]
    Sink(String),
}

impl ClientError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The message carried by the error summary.
    #[must_use]
    pub fn summary_message(&self) -> String {
        match self {
            Self::Timeout(_) => self.to_string(),
            Self::Http { status, .. } => format!("Request error: {}", status_line(*status)),
            Self::Request(_) => format!("Request error: {self}"),
            _ => format!("Unexpected error: {self}"),
        }
    }

    /// Convert into the degraded summary returned to callers.
    #[must_use]
    pub fn to_summary(&self) -> Summary {
        Summary::error(self.summary_message())
    }
}

/// Whole seconds when the duration has no fraction, milliseconds otherwise.
fn describe_duration(duration: &Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{} seconds", duration.as_secs())
    } else {
        format!("{} milliseconds", duration.as_millis())
    }
}

/// `HTTP <code>` followed by the reason phrase when one is known.
fn status_line(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) => format!("HTTP {status} {reason}"),
        None => format!("HTTP {status}"),
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_timeout_summary() {
        let summary = ClientError::Timeout(Duration::from_secs(120)).to_summary();
        assert_eq!(summary.text, "Error: Request took longer than 120 seconds");
        assert!(summary.sql_queries.is_empty());
        assert!(summary.citations.is_empty());
        assert!(summary.is_error());
    }

    #[rstest]
    #[case(Duration::from_millis(250), "Error: Request took longer than 250 milliseconds")]
    #[case(Duration::from_millis(1500), "Error: Request took longer than 1500 milliseconds")]
    #[case(Duration::from_secs(1), "Error: Request took longer than 1 seconds")]
    fn test_timeout_summary_units(#[case] timeout: Duration, #[case] expected: &str) {
        assert_eq!(ClientError::Timeout(timeout).to_summary().text, expected);
    }

    #[test]
    fn test_http_summary_omits_body() {
        let err = ClientError::http(401, "bad token");
        assert_eq!(err.summary_message(), "Request error: HTTP 401 Unauthorized");
        assert!(!err.is_timeout());

        let err = ClientError::http(599, "<html>".repeat(500));
        assert_eq!(err.summary_message(), "Request error: HTTP 599");
    }

    #[test]
    fn test_unexpected_summary() {
        let err = ClientError::from(StreamError::BufferOverflow { limit: 10 });
        assert!(err.summary_message().starts_with("Unexpected error: Stream error:"));

        let err = ClientError::configuration("missing PAT");
        assert_eq!(
            err.to_summary().text,
            "Error: Unexpected error: Configuration error: missing PAT"
        );
    }
}
