//! Sample source error types
//!
//! Defines all errors that can occur while loading or reading raw samples.

use thiserror::Error;

/// Errors that can occur in a sample source
#[derive(Error, Debug)]
pub enum SourceError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row could not be turned into a sample
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Samples are not in strictly increasing timestamp order
    #[error("Samples out of order: {0}")]
    Unordered(String),

    /// `next_sample` was called with nothing left to read
    #[error("Source exhausted")]
    Exhausted,
}

/// Result type alias for source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::Parse {
            row: 3,
            message: "bad value".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error at row 3: bad value");
        assert_eq!(SourceError::Exhausted.to_string(), "Source exhausted");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SourceError = io_err.into();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
