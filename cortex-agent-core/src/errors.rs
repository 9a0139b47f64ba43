//! Error types for cortex-agent.
//!
//! Parsing of streamed frames is lenient and never fails; these errors only
//! surface from whole-document parsing such as non-streaming JSON responses.

use thiserror::Error;

/// The main error type for cortex-agent core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CoreError {
    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
