//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding a remote payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// A content line could not be parsed.
    #[error("malformed content line {line}: {message}")]
    MalformedLine {
        /// 1-based logical line number (after unfolding).
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// BEGIN/END nesting is broken.
    #[error("invalid component structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create a malformed line error.
    pub fn malformed_line(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::malformed_line(3, "missing ':'");
        assert_eq!(err.to_string(), "malformed content line 3: missing ':'");

        let err = CodecError::invalid_structure("unterminated VTODO");
        assert!(err.to_string().contains("VTODO"));
    }
}
