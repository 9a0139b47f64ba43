//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while decoding a stream.
///
/// Malformed frames are not errors: the decoder skips them and keeps going.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A single line grew past the buffer limit without a newline.
    #[error("Buffer overflow: line exceeds {limit} bytes")]
    BufferOverflow {
        /// The limit that was exceeded.
        limit: usize,
    },

    /// The underlying byte source failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::BufferOverflow { limit: 16 };
        assert_eq!(err.to_string(), "Buffer overflow: line exceeds 16 bytes");

        let err = StreamError::from(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(err.to_string(), "IO error: eof");
    }
}
